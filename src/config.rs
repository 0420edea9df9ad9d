//! Bench configuration.
//!
//! Settings are layered from an optional TOML file (see `config/default.toml`)
//! and environment variables prefixed with `PABENCH_`. Every field carries a
//! serde default matching the values the bench was commissioned with, so the
//! program runs without any configuration file at all.
//!
//! Example:
//!
//! ```toml
//! [instruments]
//! scope_resource = "192.168.0.253:5025"
//! supply_resource = "192.168.0.251:5025"
//! supply_channel = 2
//!
//! [bias]
//! supply_voltage = 12.0
//! supply_current_limit = 0.3
//! ```
//!
//! Environment overrides use `__` as the level separator, e.g.
//! `PABENCH_BIAS__SUPPLY_VOLTAGE=13.5`.

use crate::error::{BenchError, BenchResult};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Top-level settings tree for a bench session.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub instruments: InstrumentSettings,
    #[serde(default)]
    pub bias: BiasSettings,
    #[serde(default)]
    pub drive: DriveSettings,
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub frequency_sweep: SweepRange,
    #[serde(default = "bode_sweep_default")]
    pub bode_sweep: SweepRange,
    #[serde(default)]
    pub dc_sweep: DcSweepSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Network addresses of the two bench instruments.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentSettings {
    /// Oscilloscope-with-generator SCPI socket address.
    #[serde(default = "default_scope_resource")]
    pub scope_resource: String,
    /// DC supply SCPI socket address.
    #[serde(default = "default_supply_resource")]
    pub supply_resource: String,
    /// Supply output channel the amplifier is wired to.
    #[serde(default = "default_supply_channel")]
    pub supply_channel: u8,
    /// Transport read/write timeout in seconds.
    #[serde(default = "default_io_timeout")]
    pub io_timeout_s: f64,
}

/// DC operating point applied before driving the amplifier.
#[derive(Debug, Clone, Deserialize)]
pub struct BiasSettings {
    /// Supply voltage in volts.
    #[serde(default = "default_supply_voltage")]
    pub supply_voltage: f64,
    /// Supply current limit in amperes.
    #[serde(default = "default_current_limit")]
    pub supply_current_limit: f64,
}

/// Generator drive applied to the amplifier input.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveSettings {
    /// Drive amplitude in volts peak-to-peak.
    #[serde(default = "default_drive_amplitude")]
    pub amplitude_vpp: f64,
    /// Fundamental drive frequency in Hz.
    #[serde(default = "default_drive_frequency")]
    pub frequency_hz: f64,
    /// Assumed load impedance at the amplifier output, in ohms.
    #[serde(default = "default_load_ohms")]
    pub load_ohms: f64,
    /// Reference current for bode magnitude normalization, in amperes.
    #[serde(default = "default_reference_current")]
    pub reference_current: f64,
}

/// Settle delays between configuration changes and measurements.
///
/// These are physical settling constraints, not software tunables; the
/// defaults are the values the bench was characterized with.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingSettings {
    /// Wait after placing an FFT marker before reading its amplitude.
    #[serde(default = "default_one_second")]
    pub marker_settle_s: f64,
    /// Wait after a generator frequency change before reading Vrms.
    #[serde(default = "default_one_second")]
    pub sweep_settle_s: f64,
    /// Wait after pulsing the supply off during the DC sweep.
    #[serde(default = "default_dc_settle")]
    pub dc_settle_s: f64,
}

/// Evenly spaced frequency band for a sweep phase.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepRange {
    #[serde(default = "default_sweep_start")]
    pub start_hz: f64,
    #[serde(default = "default_sweep_stop")]
    pub stop_hz: f64,
    #[serde(default = "default_sweep_points")]
    pub points: usize,
}

/// DC operating-point sweep over supply current limits.
#[derive(Debug, Clone, Deserialize)]
pub struct DcSweepSettings {
    #[serde(default = "default_dc_min")]
    pub min_current: f64,
    #[serde(default = "default_dc_max")]
    pub max_current: f64,
    #[serde(default = "default_dc_points")]
    pub points: usize,
}

/// Result sink output location.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_scope_resource() -> String {
    "192.168.0.253:5025".to_string()
}
fn default_supply_resource() -> String {
    "192.168.0.251:5025".to_string()
}
fn default_supply_channel() -> u8 {
    2
}
fn default_io_timeout() -> f64 {
    10.0
}
fn default_supply_voltage() -> f64 {
    12.0
}
fn default_current_limit() -> f64 {
    0.3
}
fn default_drive_amplitude() -> f64 {
    1.0
}
fn default_drive_frequency() -> f64 {
    14.0e6
}
fn default_load_ohms() -> f64 {
    50.0
}
fn default_reference_current() -> f64 {
    50.0e-3
}
fn default_one_second() -> f64 {
    1.0
}
fn default_dc_settle() -> f64 {
    0.01
}
fn default_sweep_start() -> f64 {
    4.0e6
}
fn default_sweep_stop() -> f64 {
    18.0e6
}
fn default_sweep_points() -> usize {
    41
}
fn bode_sweep_default() -> SweepRange {
    SweepRange {
        start_hz: 1.0e6,
        stop_hz: 100.0e6,
        points: 100,
    }
}
fn default_dc_min() -> f64 {
    0.01
}
fn default_dc_max() -> f64 {
    1.0
}
fn default_dc_points() -> usize {
    20
}
fn default_output_dir() -> String {
    "results".to_string()
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self {
            scope_resource: default_scope_resource(),
            supply_resource: default_supply_resource(),
            supply_channel: default_supply_channel(),
            io_timeout_s: default_io_timeout(),
        }
    }
}

impl Default for BiasSettings {
    fn default() -> Self {
        Self {
            supply_voltage: default_supply_voltage(),
            supply_current_limit: default_current_limit(),
        }
    }
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            amplitude_vpp: default_drive_amplitude(),
            frequency_hz: default_drive_frequency(),
            load_ohms: default_load_ohms(),
            reference_current: default_reference_current(),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            marker_settle_s: default_one_second(),
            sweep_settle_s: default_one_second(),
            dc_settle_s: default_dc_settle(),
        }
    }
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            start_hz: default_sweep_start(),
            stop_hz: default_sweep_stop(),
            points: default_sweep_points(),
        }
    }
}

impl Default for DcSweepSettings {
    fn default() -> Self {
        Self {
            min_current: default_dc_min(),
            max_current: default_dc_max(),
            points: default_dc_points(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            instruments: InstrumentSettings::default(),
            bias: BiasSettings::default(),
            drive: DriveSettings::default(),
            timing: TimingSettings::default(),
            frequency_sweep: SweepRange::default(),
            bode_sweep: bode_sweep_default(),
            dc_sweep: DcSweepSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from the given TOML file (if any) layered with
    /// `PABENCH_*` environment variables, then validates them.
    pub fn load(path: Option<&Path>) -> BenchResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        } else {
            builder = builder.add_source(File::with_name("config/default").required(false));
        }
        let settings: Settings = builder
            .add_source(Environment::with_prefix("PABENCH").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values that parse but cannot drive the bench.
    pub fn validate(&self) -> BenchResult<()> {
        if self.drive.load_ohms <= 0.0 {
            return Err(BenchError::Configuration(format!(
                "load impedance must be positive, got {}",
                self.drive.load_ohms
            )));
        }
        if self.drive.reference_current <= 0.0 {
            return Err(BenchError::Configuration(format!(
                "reference current must be positive, got {}",
                self.drive.reference_current
            )));
        }
        for (name, range) in [
            ("frequency_sweep", &self.frequency_sweep),
            ("bode_sweep", &self.bode_sweep),
        ] {
            if range.points == 0 {
                return Err(BenchError::Configuration(format!(
                    "{name} must have at least one point"
                )));
            }
            if range.stop_hz <= range.start_hz {
                return Err(BenchError::Configuration(format!(
                    "{name} stop frequency must exceed start frequency"
                )));
            }
        }
        if self.dc_sweep.points == 0 {
            return Err(BenchError::Configuration(
                "dc_sweep must have at least one point".to_string(),
            ));
        }
        if self.dc_sweep.max_current < self.dc_sweep.min_current {
            return Err(BenchError::Configuration(
                "dc_sweep max current below min current".to_string(),
            ));
        }
        Ok(())
    }
}
