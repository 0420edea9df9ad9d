//! Bench session and phase controller.
//!
//! A [`Session`] exclusively owns both instrument handles for the duration
//! of the test and drives them through a fixed, linear sequence of phases:
//! initialize, DC bias + single-point power, harmonic spectrum capture,
//! frequency sweep, bode sweep, DC operating-point sweep, shutdown. No phase
//! runs out of order and none is retried; any instrument failure in the
//! measurement phases is fatal to the session.
//!
//! The one invariant that outranks everything else: shutdown runs on every
//! exit path, so the amplifier is never left with its outputs energized.

use crate::config::Settings;
use crate::error::{BenchError, BenchResult};
use crate::gate::{GateDecision, OperatorGate};
use crate::instrument::scope::{Coupling, Marker, Oscilloscope, ScopeCommand, Waveform};
use crate::instrument::supply::{PowerSupply, SupplyCommand};
use crate::measure::{HarmonicSpectrum, Sample};
use crate::reduce;
use crate::sink::{ChartSpec, ResultSink};
use crate::sweep::{linspace, run_sweep, SweepStep};
use async_trait::async_trait;
use log::{info, warn};
use std::sync::Mutex;
use std::time::Duration;

/// Amplifier output is probed on channel 1; the generator sync reference
/// sits on channel 2 for the bode phase measurement.
const OUTPUT_CHANNEL: u8 = 1;
const REFERENCE_CHANNEL: u8 = 2;

/// Timebase used for time-domain RMS readings (50 ns/div at 14 MHz).
const TIME_DOMAIN_SCALE_S: f64 = 5.0e-8;
/// Slower timebase while the FFT trace is displayed.
const FFT_TIMEBASE_SCALE_S: f64 = 1.0e-6;
/// FFT span as a multiple of the fundamental: covers the first five
/// harmonics with margin.
const HARMONIC_SPAN_FACTOR: f64 = 5.5;

/// Instrument configuration the controller believes is in effect.
/// Mutated only by the session's transition helpers.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionState {
    pub generator_on: bool,
    pub supply_on: bool,
    pub protection_on: bool,
    pub fft_display: bool,
}

/// Derived single-point measurements from the bias phase.
#[derive(Clone, Copy, Debug)]
pub struct PowerReport {
    pub supply_volts: f64,
    pub idle_current: f64,
    pub active_current: f64,
    pub dc_power: f64,
    pub output_vrms: f64,
    pub rf_power: f64,
}

/// Owns both instrument handles, the result sink, and the operator gate
/// for one characterization run.
pub struct Session {
    scope: Oscilloscope,
    supply: PowerSupply,
    sink: Box<dyn ResultSink>,
    gate: Box<dyn OperatorGate>,
    settings: Settings,
    state: SessionState,
}

impl Session {
    pub fn new(
        scope: Oscilloscope,
        supply: PowerSupply,
        sink: Box<dyn ResultSink>,
        gate: Box<dyn OperatorGate>,
        settings: Settings,
    ) -> Self {
        Self {
            scope,
            supply,
            sink,
            gate,
            settings,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the whole characterization. Shutdown is attempted on every exit
    /// path: normal completion, any fatal error, and operator abort.
    pub async fn run(&mut self) -> BenchResult<()> {
        let outcome = self.run_phases().await;
        let shutdown = self.shutdown().await;
        match outcome {
            Ok(()) => shutdown,
            Err(err) => {
                if let Err(shutdown_err) = shutdown {
                    warn!("shutdown after failure also failed: {shutdown_err}");
                }
                Err(err)
            }
        }
    }

    async fn run_phases(&mut self) -> BenchResult<()> {
        self.initialize().await?;
        let report = self.single_point_power().await?;
        let spectrum = self.capture_harmonics().await?;
        self.report_single_point(&report, &spectrum).await?;
        self.frequency_sweep().await?;
        self.bode_sweep().await?;
        self.dc_operating_point_sweep().await?;
        info!("all test phases completed");
        Ok(())
    }

    /// Phase 1: known-safe starting configuration. Terminal failure if the
    /// instruments do not acknowledge.
    async fn initialize(&mut self) -> BenchResult<()> {
        info!("phase 1: initialize bench");
        for channel in [OUTPUT_CHANNEL, REFERENCE_CHANNEL] {
            self.scope
                .command(ScopeCommand::ProbeScale {
                    channel,
                    factor: 1.0,
                })
                .await?;
        }
        self.scope.command(ScopeCommand::TriggerSweepAuto).await?;
        self.scope
            .command(ScopeCommand::TriggerEdgeSource {
                channel: OUTPUT_CHANNEL,
            })
            .await?;
        self.scope
            .command(ScopeCommand::TriggerEdgeLevel { volts: 0.0 })
            .await?;
        self.set_supply_output(false).await?;
        self.set_generator_output(false).await?;
        Ok(())
    }

    /// Phase 2: apply bias and drive, then take the single-point power
    /// measurements. Idle current is read before the generator output is
    /// enabled so the reading actually measures an undriven amplifier.
    async fn single_point_power(&mut self) -> BenchResult<PowerReport> {
        info!("phase 2: dc bias and single-point power");
        let bias_volts = self.settings.bias.supply_voltage;
        let bias_limit = self.settings.bias.supply_current_limit;
        let drive_hz = self.settings.drive.frequency_hz;
        let drive_vpp = self.settings.drive.amplitude_vpp;

        self.supply
            .command(SupplyCommand::Voltage { volts: bias_volts })
            .await?;
        self.supply
            .command(SupplyCommand::CurrentLimit { amps: bias_limit })
            .await?;
        self.set_supply_output(true).await?;

        self.scope
            .command(ScopeCommand::GeneratorFunction(Waveform::Sine))
            .await?;
        self.scope
            .command(ScopeCommand::GeneratorFrequency { hz: drive_hz })
            .await?;
        settle(self.settings.timing.sweep_settle_s).await;
        let idle = self.supply.measure_current().await?;

        self.scope
            .command(ScopeCommand::GeneratorAmplitude { vpp: drive_vpp })
            .await?;
        self.set_generator_output(true).await?;

        self.scope
            .command(ScopeCommand::TimebaseScale {
                seconds_per_div: TIME_DOMAIN_SCALE_S,
            })
            .await?;
        self.scope
            .command(ScopeCommand::ChannelCoupling {
                channel: OUTPUT_CHANNEL,
                coupling: Coupling::Ac,
            })
            .await?;
        self.scope
            .command(ScopeCommand::ChannelDisplay {
                channel: OUTPUT_CHANNEL,
                on: true,
            })
            .await?;
        self.set_fft_display(false).await?;
        settle(self.settings.timing.sweep_settle_s).await;

        let supply_volts = self.supply.voltage_setpoint().await?;
        let active = self.supply.measure_current().await?;
        let vrms = self.scope.measure_vrms(OUTPUT_CHANNEL).await?;

        let dc_power = reduce::power(supply_volts.value, active.value);
        let rf_power = reduce::rf_output_power(vrms.value, self.settings.drive.load_ohms);
        info!("output voltage: {:.4} Vrms", vrms.value);
        info!("power on antenna: {:.4} W", rf_power);

        Ok(PowerReport {
            supply_volts: supply_volts.value,
            idle_current: idle.value,
            active_current: active.value,
            dc_power,
            output_vrms: vrms.value,
            rf_power,
        })
    }

    /// Phase 3: harmonic spectrum capture through the FFT display and the
    /// movable marker pair. The time-domain display is restored whether or
    /// not the capture succeeds.
    async fn capture_harmonics(&mut self) -> BenchResult<HarmonicSpectrum> {
        info!("phase 3: harmonic spectrum capture");
        // Re-assert bias, this time with overcurrent protection armed.
        self.supply
            .command(SupplyCommand::Voltage {
                volts: self.settings.bias.supply_voltage,
            })
            .await?;
        self.supply
            .command(SupplyCommand::CurrentLimit {
                amps: self.settings.bias.supply_current_limit,
            })
            .await?;
        self.set_protection(true).await?;
        self.set_supply_output(true).await?;

        let captured = self.capture_harmonics_inner().await;
        let restored = self.restore_time_domain().await;
        match captured {
            Ok(spectrum) => {
                restored?;
                Ok(spectrum)
            }
            Err(err) => {
                if let Err(restore_err) = restored {
                    warn!("display restore after failed capture also failed: {restore_err}");
                }
                Err(err)
            }
        }
    }

    async fn capture_harmonics_inner(&mut self) -> BenchResult<HarmonicSpectrum> {
        self.scope
            .command(ScopeCommand::ChannelDisplay {
                channel: OUTPUT_CHANNEL,
                on: false,
            })
            .await?;
        self.set_fft_display(true).await?;

        let f0 = self.scope.generator_frequency().await?;
        let span = HARMONIC_SPAN_FACTOR * f0;
        self.scope
            .command(ScopeCommand::FftCenter { hz: span / 2.0 })
            .await?;
        self.scope.command(ScopeCommand::FftSpan { hz: span }).await?;
        self.scope
            .command(ScopeCommand::FftSource {
                channel: OUTPUT_CHANNEL,
            })
            .await?;
        self.scope
            .command(ScopeCommand::TimebaseScale {
                seconds_per_div: FFT_TIMEBASE_SCALE_S,
            })
            .await?;
        self.scope
            .command(ScopeCommand::MarkerSourceFft { marker: Marker::X1 })
            .await?;
        self.scope
            .command(ScopeCommand::MarkerSourceFft { marker: Marker::X2 })
            .await?;
        self.scope.command(ScopeCommand::MarkerModeWaveform).await?;

        // Two markers per round-trip: harmonics 1-2, then 3-4, then 5 alone.
        let (fundamental, h2) = self.read_marker_pair(f0, Some(2.0 * f0)).await?;
        let (h3, h4) = self.read_marker_pair(3.0 * f0, Some(4.0 * f0)).await?;
        let (h5, _) = self.read_marker_pair(5.0 * f0, None).await?;

        Ok(HarmonicSpectrum {
            fundamental,
            h2,
            h3,
            h4,
            h5,
        })
    }

    /// Places the marker pair, waits out the marker settle, then reads the
    /// amplitudes back. The second slot is optional for the odd final
    /// harmonic.
    async fn read_marker_pair(
        &mut self,
        x1_hz: f64,
        x2_hz: Option<f64>,
    ) -> BenchResult<(f64, f64)> {
        self.scope
            .command(ScopeCommand::MarkerPosition {
                marker: Marker::X1,
                hz: x1_hz,
            })
            .await?;
        if let Some(hz) = x2_hz {
            self.scope
                .command(ScopeCommand::MarkerPosition {
                    marker: Marker::X2,
                    hz,
                })
                .await?;
        }
        settle(self.settings.timing.marker_settle_s).await;

        let first = self.scope.marker_amplitude(Marker::X1).await?.value;
        let second = match x2_hz {
            Some(_) => self.scope.marker_amplitude(Marker::X2).await?.value,
            None => f64::NAN,
        };
        Ok((first, second))
    }

    async fn restore_time_domain(&mut self) -> BenchResult<()> {
        self.scope
            .command(ScopeCommand::ChannelDisplay {
                channel: OUTPUT_CHANNEL,
                on: true,
            })
            .await?;
        self.set_fft_display(false).await?;
        self.scope
            .command(ScopeCommand::TimebaseScale {
                seconds_per_div: TIME_DOMAIN_SCALE_S,
            })
            .await?;
        Ok(())
    }

    /// Writes the single-point summary record and the output spectrum
    /// table/chart, with efficiency and THD embedded in the chart title.
    async fn report_single_point(
        &mut self,
        report: &PowerReport,
        spectrum: &HarmonicSpectrum,
    ) -> BenchResult<()> {
        let load = self.settings.drive.load_ohms;
        let watts = reduce::harmonic_power_spectrum(spectrum, load);
        let rf_fundamental = watts[0];
        let eff = reduce::efficiency(rf_fundamental, report.dc_power)?;
        let thd = reduce::thd(spectrum)?;
        let f0_mhz = self.settings.drive.frequency_hz / 1.0e6;
        info!("THD: {:.2} %", thd * 100.0);

        let entries = vec![
            (
                "Supply voltage".to_string(),
                format!("{} V", report.supply_volts),
            ),
            (
                "Current draw (idle)".to_string(),
                format!("{} A", report.idle_current),
            ),
            (
                "Current draw (active)".to_string(),
                format!("{} A", report.active_current),
            ),
            (
                "DC power consumption".to_string(),
                format!("{} W", report.dc_power),
            ),
            (
                "Measured harmonics (dBV)".to_string(),
                format!("{:?}", spectrum.as_dbv()),
            ),
            (
                format!("RF power output at {f0_mhz} MHz"),
                format!("{} W", rf_fundamental),
            ),
            (
                "DC-to-RF power conversion efficiency".to_string(),
                format!("{:.2} %", eff * 100.0),
            ),
            (
                "Total harmonic distortion".to_string(),
                format!("{:.2} %", thd * 100.0),
            ),
        ];
        self.sink.write_record("power_summary", &entries).await?;

        let harmonic_numbers: Vec<f64> = (1..=5).map(f64::from).collect();
        self.sink
            .write_table(
                "spectrum",
                "harmonic",
                "power_w",
                &harmonic_numbers,
                &watts,
            )
            .await?;
        self.sink
            .write_chart(&ChartSpec {
                name: "spectrum".to_string(),
                title: format!(
                    "PA Output Spectrum: f = {:.1} MHz, eff = {:.1} %, THD = {:.1} %",
                    f0_mhz,
                    eff * 100.0,
                    thd * 100.0
                ),
                x_label: "Harmonic number".to_string(),
                y_label: "RF output power [W]".to_string(),
                x: harmonic_numbers,
                y: watts.to_vec(),
                log_y: true,
            })
            .await?;
        Ok(())
    }

    /// Phase 4: RMS output voltage across the configured frequency band.
    async fn frequency_sweep(&mut self) -> BenchResult<()> {
        let range = self.settings.frequency_sweep.clone();
        info!(
            "phase 4: frequency sweep, {} points {:.1}-{:.1} MHz",
            range.points,
            range.start_hz / 1.0e6,
            range.stop_hz / 1.0e6
        );
        let setpoints = linspace(range.start_hz, range.stop_hz, range.points);
        let settle_for = Duration::from_secs_f64(self.settings.timing.sweep_settle_s);
        let points = {
            let step = GeneratorFrequencyStep { scope: &self.scope };
            run_sweep(&step, &setpoints, settle_for).await?
        };

        let load = self.settings.drive.load_ohms;
        let freq: Vec<f64> = points.iter().map(|p| p.setpoint).collect();
        let vout: Vec<f64> = points.iter().map(|p| p.sample.value).collect();
        let prf: Vec<f64> = vout
            .iter()
            .map(|&v| reduce::rf_output_power(v, load))
            .collect();

        self.sink
            .write_table("frequency_vs_vout", "frequency_hz", "vrms_v", &freq, &vout)
            .await?;
        self.sink
            .write_table("pout", "frequency_hz", "power_w", &freq, &prf)
            .await?;

        let freq_mhz: Vec<f64> = freq.iter().map(|f| f / 1.0e6).collect();
        let title = format!(
            "PA Frequency Response for Vin = {:.1} Vpp",
            self.settings.drive.amplitude_vpp
        );
        self.sink
            .write_chart(&ChartSpec {
                name: "pout_dbw".to_string(),
                title: title.clone(),
                x_label: "Frequency [MHz]".to_string(),
                y_label: "RF output power [dBW]".to_string(),
                x: freq_mhz.clone(),
                y: prf.iter().map(|&p| reduce::power_dbw(p)).collect(),
                log_y: false,
            })
            .await?;
        self.sink
            .write_chart(&ChartSpec {
                name: "pout".to_string(),
                title,
                x_label: "Frequency [MHz]".to_string(),
                y_label: "RF output power [W]".to_string(),
                x: freq_mhz,
                y: prf,
                log_y: true,
            })
            .await?;
        Ok(())
    }

    /// Phase 5: complex frequency response. Magnitude comes from the RMS
    /// reading normalized to the reference current; phase from the scope's
    /// inter-channel phase measurement against the generator sync.
    async fn bode_sweep(&mut self) -> BenchResult<()> {
        let range = self.settings.bode_sweep.clone();
        info!(
            "phase 5: bode sweep, {} points {:.1}-{:.1} MHz",
            range.points,
            range.start_hz / 1.0e6,
            range.stop_hz / 1.0e6
        );
        let setpoints = linspace(range.start_hz, range.stop_hz, range.points);
        let settle_for = Duration::from_secs_f64(self.settings.timing.sweep_settle_s);
        let (points, phases) = {
            let step = BodeStep {
                scope: &self.scope,
                phases: Mutex::new(Vec::with_capacity(setpoints.len())),
            };
            let points = run_sweep(&step, &setpoints, settle_for).await?;
            let phases = match step.phases.into_inner() {
                Ok(phases) => phases,
                Err(poisoned) => poisoned.into_inner(),
            };
            (points, phases)
        };

        let freq: Vec<f64> = points.iter().map(|p| p.setpoint).collect();
        let vrms: Vec<f64> = points.iter().map(|p| p.sample.value).collect();
        let magnitude = reduce::magnitude_db(&vrms, self.settings.drive.reference_current)?;

        self.sink
            .write_table("bode_magnitude", "frequency_hz", "magnitude_db", &freq, &magnitude)
            .await?;
        self.sink
            .write_table("bode_phase", "frequency_hz", "phase_deg", &freq, &phases)
            .await?;

        let freq_mhz: Vec<f64> = freq.iter().map(|f| f / 1.0e6).collect();
        self.sink
            .write_chart(&ChartSpec {
                name: "bode_magnitude".to_string(),
                title: "Bode Plot: Magnitude vs. Frequency".to_string(),
                x_label: "Frequency (MHz)".to_string(),
                y_label: "Magnitude (dB)".to_string(),
                x: freq_mhz.clone(),
                y: magnitude,
                log_y: false,
            })
            .await?;
        self.sink
            .write_chart(&ChartSpec {
                name: "bode_phase".to_string(),
                title: "Bode Plot: Phase vs. Frequency".to_string(),
                x_label: "Frequency (MHz)".to_string(),
                y_label: "Phase (degrees)".to_string(),
                x: freq_mhz,
                y: phases,
                log_y: false,
            })
            .await?;
        info!("bode sweep finished");
        Ok(())
    }

    /// Phase 6: maximum-output sweep over supply current limits, pulsing
    /// the supply output off after every reading. Gated on explicit
    /// operator confirmation; `!` aborts the whole session.
    async fn dc_operating_point_sweep(&mut self) -> BenchResult<()> {
        info!("phase 6: dc operating-point sweep");
        let decision = self.gate.confirm(
            "Maximum output power sweep will drive the amplifier to full supply current.",
        )?;
        if decision == GateDecision::Abort {
            warn!("operator aborted before the dc operating-point sweep");
            return Err(BenchError::UserAbort);
        }
        info!("starting maximum output power sweep");

        self.supply
            .command(SupplyCommand::Voltage {
                volts: self.settings.bias.supply_voltage,
            })
            .await?;
        self.set_protection(false).await?;

        let sweep = self.settings.dc_sweep.clone();
        let setpoints = linspace(sweep.min_current, sweep.max_current, sweep.points);
        let settle_for = Duration::from_secs_f64(self.settings.timing.dc_settle_s);
        let points = {
            let step = PulsedSupplyStep {
                supply: &self.supply,
                scope: &self.scope,
            };
            run_sweep(&step, &setpoints, settle_for).await?
        };
        // The step left the output pulsed off after the final reading.
        self.state.supply_on = false;
        self.set_supply_output(false).await?;

        let currents: Vec<f64> = points.iter().map(|p| p.setpoint).collect();
        let vrms: Vec<f64> = points.iter().map(|p| p.sample.value).collect();
        let vmax = vrms.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        info!("maximum output voltage: {:.4} Vrms", vmax);

        self.sink
            .write_record(
                "dc_sweep_summary",
                &[(
                    "Maximum output voltage".to_string(),
                    format!("{vmax} Vrms"),
                )],
            )
            .await?;
        self.sink
            .write_table("current_vs_vrms", "current_a", "vrms_v", &currents, &vrms)
            .await?;
        self.sink
            .write_chart(&ChartSpec {
                name: "current_vs_vrms".to_string(),
                title: "DC Current vs. Output Vrms".to_string(),
                x_label: "DC Current [A]".to_string(),
                y_label: "Output Vrms [V]".to_string(),
                x: currents,
                y: vrms,
                log_y: false,
            })
            .await?;
        Ok(())
    }

    /// Phase 7: de-energize everything and release both handles. Every step
    /// is attempted even if an earlier one fails; the first error is kept.
    async fn shutdown(&mut self) -> BenchResult<()> {
        info!("phase 7: shutdown, de-energizing outputs");
        let mut first_err: Option<BenchError> = None;

        note(
            &mut first_err,
            self.scope
                .command(ScopeCommand::GeneratorOutput { on: false })
                .await,
        );
        self.state.generator_on = false;

        note(
            &mut first_err,
            self.supply.command(SupplyCommand::Output { on: false }).await,
        );
        self.state.supply_on = false;

        note(&mut first_err, self.scope.close().await);
        note(&mut first_err, self.supply.close().await);

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn set_generator_output(&mut self, on: bool) -> BenchResult<()> {
        self.scope
            .command(ScopeCommand::GeneratorOutput { on })
            .await?;
        self.state.generator_on = on;
        Ok(())
    }

    async fn set_supply_output(&mut self, on: bool) -> BenchResult<()> {
        self.supply.command(SupplyCommand::Output { on }).await?;
        self.state.supply_on = on;
        Ok(())
    }

    async fn set_protection(&mut self, on: bool) -> BenchResult<()> {
        self.supply
            .command(SupplyCommand::OvercurrentProtection { on })
            .await?;
        self.state.protection_on = on;
        Ok(())
    }

    async fn set_fft_display(&mut self, on: bool) -> BenchResult<()> {
        self.scope.command(ScopeCommand::FftDisplay { on }).await?;
        self.state.fft_display = on;
        Ok(())
    }
}

fn note(first: &mut Option<BenchError>, result: BenchResult<()>) {
    if let Err(err) = result {
        warn!("shutdown step failed: {err}");
        if first.is_none() {
            *first = Some(err);
        }
    }
}

async fn settle(seconds: f64) {
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}

struct GeneratorFrequencyStep<'a> {
    scope: &'a Oscilloscope,
}

#[async_trait]
impl SweepStep for GeneratorFrequencyStep<'_> {
    async fn configure(&self, hz: f64) -> BenchResult<()> {
        self.scope
            .command(ScopeCommand::GeneratorFrequency { hz })
            .await
    }

    async fn measure(&self, _setpoint: f64) -> BenchResult<Sample> {
        self.scope.measure_vrms(OUTPUT_CHANNEL).await
    }
}

/// Frequency step that also captures the inter-channel phase alongside the
/// RMS reading, so the bode phase comes from one pass over the band.
struct BodeStep<'a> {
    scope: &'a Oscilloscope,
    phases: Mutex<Vec<f64>>,
}

#[async_trait]
impl SweepStep for BodeStep<'_> {
    async fn configure(&self, hz: f64) -> BenchResult<()> {
        self.scope
            .command(ScopeCommand::GeneratorFrequency { hz })
            .await
    }

    async fn measure(&self, _setpoint: f64) -> BenchResult<Sample> {
        let vrms = self.scope.measure_vrms(OUTPUT_CHANNEL).await?;
        let phase = self
            .scope
            .measure_phase(OUTPUT_CHANNEL, REFERENCE_CHANNEL)
            .await?;
        match self.phases.lock() {
            Ok(mut phases) => phases.push(phase.value),
            Err(poisoned) => poisoned.into_inner().push(phase.value),
        }
        Ok(vrms)
    }
}

/// Supply current-limit step that pulses the output: enabled for the
/// reading, disabled again before the next setpoint.
struct PulsedSupplyStep<'a> {
    supply: &'a PowerSupply,
    scope: &'a Oscilloscope,
}

#[async_trait]
impl SweepStep for PulsedSupplyStep<'_> {
    async fn configure(&self, amps: f64) -> BenchResult<()> {
        self.supply
            .command(SupplyCommand::CurrentLimit { amps })
            .await?;
        self.supply.command(SupplyCommand::Output { on: true }).await
    }

    async fn measure(&self, _setpoint: f64) -> BenchResult<Sample> {
        self.scope.measure_vrms(OUTPUT_CHANNEL).await
    }

    async fn after_measure(&self, _setpoint: f64) -> BenchResult<()> {
        self.supply.command(SupplyCommand::Output { on: false }).await
    }
}
