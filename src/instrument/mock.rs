//! Simulated bench for tests and `--mock` runs.
//!
//! [`MockBench`] models the two instruments behind the same
//! [`CommandChannel`] trait the real transports implement: it parses the
//! SCPI grammar the drivers emit, tracks generator and supply state, and
//! synthesizes plausible readings from a simple amplifier model (a band
//! response peaked at the drive frequency, output compressed by the supply
//! current limit). Every command is recorded so tests can assert ordering
//! and the outputs-off shutdown invariant.

use crate::error::{BenchError, BenchResult};
use crate::instrument::CommandChannel;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const CENTER_HZ: f64 = 14.0e6;
const BANDWIDTH_HZ: f64 = 6.0e6;
const VOLTAGE_GAIN: f64 = 10.0;

#[derive(Debug)]
struct BenchState {
    generator_on: bool,
    generator_hz: f64,
    generator_vpp: f64,
    supply_on: bool,
    supply_volts: f64,
    supply_current_limit: f64,
    protection_on: bool,
    channel1_display: bool,
    fft_display: bool,
    marker_x1_hz: f64,
    marker_x2_hz: f64,
    commands: Vec<String>,
    fail_on: Option<String>,
    scope_closed: bool,
    supply_closed: bool,
}

impl Default for BenchState {
    fn default() -> Self {
        Self {
            generator_on: false,
            generator_hz: 1.0e6,
            generator_vpp: 0.0,
            supply_on: false,
            supply_volts: 0.0,
            supply_current_limit: 0.0,
            protection_on: false,
            channel1_display: true,
            fft_display: false,
            marker_x1_hz: 0.0,
            marker_x2_hz: 0.0,
            commands: Vec::new(),
            fail_on: None,
            scope_closed: false,
            supply_closed: false,
        }
    }
}

impl BenchState {
    /// RMS output voltage of the modeled amplifier at the current state.
    fn output_vrms(&self) -> f64 {
        if !self.generator_on || !self.supply_on {
            return 1.0e-4; // noise floor
        }
        let detune = (self.generator_hz - CENTER_HZ) / BANDWIDTH_HZ;
        let gain = VOLTAGE_GAIN / (1.0 + detune * detune).sqrt();
        let vin_rms = self.generator_vpp / (2.0 * std::f64::consts::SQRT_2);
        // Output compresses as the supply current limit starves the stage.
        let headroom = self.supply_current_limit / (self.supply_current_limit + 0.2);
        vin_rms * gain * headroom
    }

    /// Output phase relative to the drive, degrees.
    fn output_phase_deg(&self) -> f64 {
        -((self.generator_hz - CENTER_HZ) / BANDWIDTH_HZ)
            .atan()
            .to_degrees()
    }

    /// Spectrum amplitude in dBV at a marker frequency, assuming the marker
    /// sits on a harmonic of the programmed fundamental.
    fn marker_dbv(&self, marker_hz: f64) -> f64 {
        let fundamental = 20.0 * self.output_vrms().max(1.0e-6).log10();
        if self.generator_hz <= 0.0 {
            return fundamental;
        }
        let order = (marker_hz / self.generator_hz).round().max(1.0);
        fundamental - 13.0 * (order - 1.0)
    }

    fn drawn_current(&self) -> f64 {
        if !self.supply_on {
            0.0
        } else if self.generator_on {
            self.supply_current_limit.min(0.27)
        } else {
            0.05
        }
    }
}

/// Shared simulated bench; hand its two channels to the drivers.
#[derive(Clone, Default)]
pub struct MockBench {
    state: Arc<Mutex<BenchState>>,
}

impl MockBench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope_channel(&self) -> MockChannel {
        MockChannel {
            role: "scope",
            state: self.state.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn supply_channel(&self) -> MockChannel {
        MockChannel {
            role: "supply",
            state: self.state.clone(),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Every command either instrument received, in arrival order,
    /// prefixed with the instrument role.
    pub fn commands(&self) -> Vec<String> {
        self.lock().commands.clone()
    }

    pub fn generator_on(&self) -> bool {
        self.lock().generator_on
    }

    pub fn supply_output_on(&self) -> bool {
        self.lock().supply_on
    }

    pub fn fft_display_on(&self) -> bool {
        self.lock().fft_display
    }

    pub fn channel1_display_on(&self) -> bool {
        self.lock().channel1_display
    }

    /// Makes the next occurrence of `wire` (command or query) fail with a
    /// communication error, for exercising fatal-failure paths.
    pub fn fail_when(&self, wire: &str) {
        self.lock().fail_on = Some(wire.to_string());
    }

    pub fn scope_closed(&self) -> bool {
        self.lock().scope_closed
    }

    pub fn supply_closed(&self) -> bool {
        self.lock().supply_closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BenchState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// One instrument endpoint of the simulated bench.
pub struct MockChannel {
    role: &'static str,
    state: Arc<Mutex<BenchState>>,
    closed: Arc<AtomicBool>,
}

impl MockChannel {
    fn guard_open(&self) -> BenchResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(BenchError::comm(self.role, "channel is closed"))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BenchState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// One-shot fault injection: fails the wire string armed by
    /// [`MockBench::fail_when`].
    fn check_fault(&self, state: &mut BenchState, command: &str) -> BenchResult<()> {
        if state.fail_on.as_deref() == Some(command) {
            state.fail_on = None;
            return Err(BenchError::comm(
                self.role,
                format!("injected fault on: {command}"),
            ));
        }
        Ok(())
    }

    fn apply_command(&self, state: &mut BenchState, command: &str) {
        if let Some(rest) = command.strip_prefix(":WGEN:FREQ ") {
            state.generator_hz = rest.trim().parse().unwrap_or(state.generator_hz);
        } else if let Some(rest) = command.strip_prefix(":WGEN:VOLT ") {
            state.generator_vpp = rest.trim().parse().unwrap_or(state.generator_vpp);
        } else if let Some(rest) = command.strip_prefix(":WGEN:OUTP ") {
            state.generator_on = rest.trim() == "ON";
        } else if let Some(rest) = command.strip_prefix(":CHAN1:DISP ") {
            state.channel1_display = rest.trim() == "ON";
        } else if let Some(rest) = command.strip_prefix(":FFT:DISP ") {
            state.fft_display = rest.trim() == "ON";
        } else if let Some(rest) = command.strip_prefix(":MARKer:X1P ") {
            state.marker_x1_hz = rest.trim().parse().unwrap_or(state.marker_x1_hz);
        } else if let Some(rest) = command.strip_prefix(":MARKer:X2P ") {
            state.marker_x2_hz = rest.trim().parse().unwrap_or(state.marker_x2_hz);
        } else if let Some(rest) = command.strip_prefix("VOLT ") {
            if let Some(value) = channel_argument(rest) {
                state.supply_volts = value;
            }
        } else if let Some(rest) = command.strip_prefix("CURR:PROT:STAT ") {
            state.protection_on = rest.split(',').next().map(str::trim) == Some("ON");
        } else if let Some(rest) = command.strip_prefix("CURR ") {
            if let Some(value) = channel_argument(rest) {
                state.supply_current_limit = value;
            }
        } else if let Some(rest) = command.strip_prefix("OUTP ") {
            state.supply_on = rest.split(',').next().map(str::trim) == Some("ON");
        }
        // Probe, trigger, coupling, timebase, FFT axis, and marker-source
        // commands affect no modeled reading; they are only logged.
    }

    fn answer(&self, state: &BenchState, query: &str) -> Option<String> {
        let value = match query {
            ":MEAS:VRMS? CHAN1" => state.output_vrms(),
            ":MEAS:PHAS? CHAN1,CHAN2" => state.output_phase_deg(),
            "WGEN:FREQ?" => state.generator_hz,
            ":MARK:Y1P?" => state.marker_dbv(state.marker_x1_hz),
            ":MARK:Y2P?" => state.marker_dbv(state.marker_x2_hz),
            "VOLT? (@2)" => state.supply_volts,
            "MEAS:CURR? CH2" => state.drawn_current(),
            _ => return None,
        };
        Some(format!("{value:+.6E}"))
    }
}

fn channel_argument(rest: &str) -> Option<f64> {
    rest.split(',').next()?.trim().parse().ok()
}

#[async_trait]
impl CommandChannel for MockChannel {
    fn name(&self) -> &str {
        self.role
    }

    async fn send(&self, command: &str) -> BenchResult<()> {
        self.guard_open()?;
        let mut state = self.lock();
        state.commands.push(format!("{}: {}", self.role, command));
        self.check_fault(&mut state, command)?;
        self.apply_command(&mut state, command);
        Ok(())
    }

    async fn query(&self, command: &str) -> BenchResult<String> {
        self.guard_open()?;
        let mut state = self.lock();
        state.commands.push(format!("{}: {}", self.role, command));
        self.check_fault(&mut state, command)?;
        self.answer(&state, command)
            .ok_or_else(|| BenchError::comm(self.role, format!("unmodeled query: {command}")))
    }

    async fn close(&self) -> BenchResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        let mut state = self.lock();
        match self.role {
            "scope" => state.scope_closed = true,
            _ => state.supply_closed = true,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driven_bench() -> MockBench {
        let bench = MockBench::new();
        {
            let mut state = bench.lock();
            state.generator_on = true;
            state.generator_hz = 14.0e6;
            state.generator_vpp = 1.0;
            state.supply_on = true;
            state.supply_volts = 12.0;
            state.supply_current_limit = 0.3;
        }
        bench
    }

    #[tokio::test]
    async fn test_vrms_peaks_at_band_center() {
        let bench = driven_bench();
        let scope = bench.scope_channel();

        let at_center: f64 = scope
            .query(":MEAS:VRMS? CHAN1")
            .await
            .unwrap()
            .parse()
            .unwrap();

        scope.send(":WGEN:FREQ 4.000000E7").await.unwrap();
        let detuned: f64 = scope
            .query(":MEAS:VRMS? CHAN1")
            .await
            .unwrap()
            .parse()
            .unwrap();

        assert!(at_center > detuned);
    }

    #[tokio::test]
    async fn test_harmonics_fall_off_with_order() {
        let bench = driven_bench();
        let scope = bench.scope_channel();

        scope.send(":MARKer:X1P 1.400000E7").await.unwrap();
        scope.send(":MARKer:X2P 2.800000E7").await.unwrap();
        let fundamental: f64 = scope.query(":MARK:Y1P?").await.unwrap().parse().unwrap();
        let second: f64 = scope.query(":MARK:Y2P?").await.unwrap().parse().unwrap();

        assert!((fundamental - second - 13.0).abs() < 1.0e-6);
    }

    #[tokio::test]
    async fn test_supply_grammar_updates_state() {
        let bench = MockBench::new();
        let supply = bench.supply_channel();

        supply.send("VOLT 12, (@2)").await.unwrap();
        supply.send("CURR 0.3, (@2)").await.unwrap();
        supply.send("OUTP ON, (@2)").await.unwrap();
        assert!(bench.supply_output_on());

        let volts: f64 = supply.query("VOLT? (@2)").await.unwrap().parse().unwrap();
        assert_eq!(volts, 12.0);

        supply.send("OUTP OFF, (@2)").await.unwrap();
        assert!(!bench.supply_output_on());
        let amps: f64 = supply
            .query("MEAS:CURR? CH2")
            .await
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(amps, 0.0);
    }

    #[tokio::test]
    async fn test_injected_fault_fires_once() {
        let bench = MockBench::new();
        let scope = bench.scope_channel();
        bench.fail_when(":WGEN:OUTP ON");

        assert!(scope.send(":WGEN:OUTP ON").await.is_err());
        assert!(scope.send(":WGEN:OUTP ON").await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_channel_refuses_io() {
        let bench = MockBench::new();
        let scope = bench.scope_channel();
        scope.close().await.unwrap();
        scope.close().await.unwrap();
        assert!(scope.send(":WGEN:OUTP OFF").await.is_err());
    }
}
