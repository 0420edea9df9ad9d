//! Measurement data types.
//!
//! A [`Sample`] is one scalar reading taken from an instrument, stamped with
//! a monotonic instant and tagged with its physical unit. Samples are
//! immutable once produced; sweeps pair them with the setpoint that produced
//! them.

use std::fmt;
use std::time::Instant;

/// Physical unit of a measurement sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Volt,
    Ampere,
    Watt,
    DecibelVolt,
    Decibel,
    Degree,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Unit::Volt => "V",
            Unit::Ampere => "A",
            Unit::Watt => "W",
            Unit::DecibelVolt => "dBV",
            Unit::Decibel => "dB",
            Unit::Degree => "deg",
        };
        f.write_str(text)
    }
}

/// A single scalar reading from an instrument. Immutable once produced.
#[derive(Clone, Copy, Debug)]
pub struct Sample {
    pub value: f64,
    pub unit: Unit,
    pub taken_at: Instant,
}

impl Sample {
    /// Stamps a fresh sample with the current monotonic instant.
    pub fn new(value: f64, unit: Unit) -> Self {
        Self {
            value,
            unit,
            taken_at: Instant::now(),
        }
    }
}

/// One (setpoint, sample) pair produced by the sweep engine. Insertion
/// order of a sweep result is the setpoint iteration order and forms the
/// x-axis of downstream tables and charts.
#[derive(Clone, Copy, Debug)]
pub struct SweepPoint {
    pub setpoint: f64,
    pub sample: Sample,
}

/// Amplitudes of the fundamental and the next four harmonics, in dBV.
///
/// A named struct rather than a positional array so the harmonic-number
/// mapping is checked by the compiler, not by convention.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarmonicSpectrum {
    pub fundamental: f64,
    pub h2: f64,
    pub h3: f64,
    pub h4: f64,
    pub h5: f64,
}

impl HarmonicSpectrum {
    /// Amplitudes as an array, index 0 = fundamental, index n = harmonic n+1.
    pub fn as_dbv(&self) -> [f64; 5] {
        [self.fundamental, self.h2, self.h3, self.h4, self.h5]
    }
}
