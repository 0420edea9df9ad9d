//! Custom error types for the bench application.
//!
//! `BenchError` is the single error type used throughout the library. The
//! variants mirror the failure classes the bench can actually hit: transport
//! failures talking to an instrument, replies that do not contain the
//! expected numeric, undefined numeric reductions, and an explicit operator
//! abort at the interactive gate. None of these are retried automatically;
//! every one of them routes the session through shutdown so the device under
//! test is never left energized.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Error, Debug)]
pub enum BenchError {
    /// Transport-level failure: timeout, disconnect, or refused write.
    /// Always fatal to the session.
    #[error("communication error with '{instrument}': {message}")]
    Communication { instrument: String, message: String },

    /// The instrument answered, but the reply did not parse as the expected
    /// numeric scalar. Distinct from `Communication` so callers can tell a
    /// dead link from a confused one.
    #[error("failed to parse reply '{reply}' from '{instrument}' as a number")]
    Parse { instrument: String, reply: String },

    /// A numeric reduction was evaluated outside its documented domain,
    /// e.g. efficiency with zero DC power. Names the offending reduction.
    #[error("domain error in {reduction}: {message}")]
    Domain {
        reduction: &'static str,
        message: String,
    },

    /// The operator typed `!` at the interactive gate. Not a failure, but
    /// still routes through shutdown and exits with a distinct status.
    #[error("test terminated by operator")]
    UserAbort,

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("result sink error: {0}")]
    Sink(String),
}

impl BenchError {
    /// Shorthand for a communication failure on a named instrument.
    pub fn comm(instrument: impl Into<String>, message: impl Into<String>) -> Self {
        BenchError::Communication {
            instrument: instrument.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a domain error in a named reduction.
    pub fn domain(reduction: &'static str, message: impl Into<String>) -> Self {
        BenchError::Domain {
            reduction,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BenchError::comm("scope", "read timeout");
        assert_eq!(
            err.to_string(),
            "communication error with 'scope': read timeout"
        );
    }

    #[test]
    fn test_parse_error_names_instrument_and_reply() {
        let err = BenchError::Parse {
            instrument: "supply".into(),
            reply: "OVER".into(),
        };
        assert!(err.to_string().contains("supply"));
        assert!(err.to_string().contains("OVER"));
    }

    #[test]
    fn test_domain_error_names_reduction() {
        let err = BenchError::domain("efficiency", "dc power is zero");
        assert!(err.to_string().contains("efficiency"));
    }
}
