//! RF power-amplifier bench characterization.
//!
//! Drives a signal-generator-equipped oscilloscope and a programmable DC
//! supply over SCPI through a fixed sequence of measurement phases: bias
//! and single-point power, harmonic spectrum, frequency sweep, bode sweep,
//! and a gated DC operating-point sweep. Derived metrics (RF power,
//! efficiency, THD, normalized magnitude) are computed by pure reductions
//! and persisted through a pluggable result sink.
//!
//! The library is organized so every seam is swappable in tests: the SCPI
//! transport behind [`instrument::CommandChannel`], the operator prompt
//! behind [`gate::OperatorGate`], and result persistence behind
//! [`sink::ResultSink`]. [`session::Session`] ties them together.

pub mod config;
pub mod error;
pub mod gate;
pub mod instrument;
pub mod measure;
pub mod reduce;
pub mod session;
pub mod sink;
pub mod sweep;
