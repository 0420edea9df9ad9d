//! Instrument command channel and typed drivers.
//!
//! The bench talks to two SCPI endpoints: an oscilloscope with a built-in
//! waveform generator, and a programmable DC supply. [`CommandChannel`]
//! abstracts the transport (TCP socket in production, a simulated bench in
//! tests); the [`scope`] and [`supply`] drivers own the command syntax and
//! the measurement primitives built on top of it.

pub mod mock;
pub mod scope;
pub mod supply;
pub mod tcp;

use crate::error::{BenchError, BenchResult};
use async_trait::async_trait;

/// Transport-level command channel to one instrument.
///
/// `send` issues a configuration or action command with no reply; `query`
/// issues a command and returns the raw reply line. Both fail with
/// [`BenchError::Communication`] on transport timeout or disconnect.
/// `close` releases the connection and is idempotent.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Human-readable instrument name, used in error messages and logs.
    fn name(&self) -> &str;

    async fn send(&self, command: &str) -> BenchResult<()>;

    async fn query(&self, command: &str) -> BenchResult<String>;

    async fn close(&self) -> BenchResult<()>;
}

/// SCPI boolean keyword.
pub(crate) fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

/// Parses a single numeric scalar out of an instrument reply.
///
/// A reply that arrived but does not contain the expected number is a
/// [`BenchError::Parse`], distinct from a transport failure, so callers can
/// tell a dead link from a confused instrument.
pub fn parse_scalar(instrument: &str, reply: &str) -> BenchResult<f64> {
    reply
        .trim()
        .parse::<f64>()
        .map_err(|_| BenchError::Parse {
            instrument: instrument.to_string(),
            reply: reply.trim().to_string(),
        })
}
