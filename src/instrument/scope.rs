//! Oscilloscope-with-generator driver.
//!
//! The command enums own the wire syntax; driver methods are the
//! measurement primitives. Each primitive issues exactly one query and
//! parses exactly one numeric scalar, with parse failures reported
//! distinctly from communication failures. No primitive retries.

use crate::error::BenchResult;
use crate::instrument::{on_off, parse_scalar, CommandChannel};
use crate::measure::{Sample, Unit};
use log::debug;

/// Generator waveform shapes the bench uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
}

/// Vertical channel coupling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coupling {
    Ac,
    Dc,
}

/// One of the scope's movable marker pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    X1,
    X2,
}

/// Configuration and action commands understood by the scope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScopeCommand {
    ProbeScale { channel: u8, factor: f64 },
    TriggerSweepAuto,
    TriggerEdgeSource { channel: u8 },
    TriggerEdgeLevel { volts: f64 },
    GeneratorFunction(Waveform),
    GeneratorFrequency { hz: f64 },
    GeneratorAmplitude { vpp: f64 },
    GeneratorOutput { on: bool },
    TimebaseScale { seconds_per_div: f64 },
    ChannelCoupling { channel: u8, coupling: Coupling },
    ChannelDisplay { channel: u8, on: bool },
    FftDisplay { on: bool },
    FftCenter { hz: f64 },
    FftSpan { hz: f64 },
    FftSource { channel: u8 },
    MarkerSourceFft { marker: Marker },
    MarkerModeWaveform,
    MarkerPosition { marker: Marker, hz: f64 },
}

impl ScopeCommand {
    /// Serializes the command to its SCPI wire form.
    pub fn scpi(&self) -> String {
        match *self {
            ScopeCommand::ProbeScale { channel, factor } => {
                format!("CHANnel{channel}:PROBe {factor:+.1}")
            }
            ScopeCommand::TriggerSweepAuto => ":TRIG:SWEep AUTO".to_string(),
            ScopeCommand::TriggerEdgeSource { channel } => {
                format!(":TRIG:EDGE:SOURce CHAN{channel}")
            }
            ScopeCommand::TriggerEdgeLevel { volts } => {
                format!(":TRIG:EDGE:LEVel {volts:+.1}")
            }
            ScopeCommand::GeneratorFunction(Waveform::Sine) => ":WGEN:FUNC SIN".to_string(),
            ScopeCommand::GeneratorFrequency { hz } => format!(":WGEN:FREQ {hz:.6E}"),
            ScopeCommand::GeneratorAmplitude { vpp } => format!(":WGEN:VOLT {vpp:.6E}"),
            ScopeCommand::GeneratorOutput { on } => {
                format!(":WGEN:OUTP {}", on_off(on))
            }
            ScopeCommand::TimebaseScale { seconds_per_div } => {
                format!(":TIMebase:SCAL {seconds_per_div:+.1E}")
            }
            ScopeCommand::ChannelCoupling { channel, coupling } => {
                let mode = match coupling {
                    Coupling::Ac => "AC",
                    Coupling::Dc => "DC",
                };
                format!(":CHAN{channel}:COUP {mode}")
            }
            ScopeCommand::ChannelDisplay { channel, on } => {
                format!(":CHAN{channel}:DISP {}", on_off(on))
            }
            ScopeCommand::FftDisplay { on } => format!(":FFT:DISP {}", on_off(on)),
            ScopeCommand::FftCenter { hz } => format!(":FFT:CENT {hz:.6E}"),
            ScopeCommand::FftSpan { hz } => format!(":FFT:SPAN {hz:.6E}"),
            ScopeCommand::FftSource { channel } => format!(":FFT:SOUR CHAN{channel}"),
            ScopeCommand::MarkerSourceFft { marker } => match marker {
                Marker::X1 => ":MARKer:X1Y1source FFT".to_string(),
                Marker::X2 => ":MARKer:X2Y2source FFT".to_string(),
            },
            ScopeCommand::MarkerModeWaveform => ":MARK:MODE WAV".to_string(),
            ScopeCommand::MarkerPosition { marker, hz } => match marker {
                Marker::X1 => format!(":MARKer:X1P {hz:.6E}"),
                Marker::X2 => format!(":MARKer:X2P {hz:.6E}"),
            },
        }
    }
}

/// Queries returning a single numeric scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeQuery {
    MeasureVrms { channel: u8 },
    MeasurePhase { channel: u8, reference: u8 },
    GeneratorFrequency,
    MarkerAmplitude { marker: Marker },
}

impl ScopeQuery {
    pub fn scpi(&self) -> String {
        match *self {
            ScopeQuery::MeasureVrms { channel } => format!(":MEAS:VRMS? CHAN{channel}"),
            ScopeQuery::MeasurePhase { channel, reference } => {
                format!(":MEAS:PHAS? CHAN{channel},CHAN{reference}")
            }
            ScopeQuery::GeneratorFrequency => "WGEN:FREQ?".to_string(),
            ScopeQuery::MarkerAmplitude { marker } => match marker {
                Marker::X1 => ":MARK:Y1P?".to_string(),
                Marker::X2 => ":MARK:Y2P?".to_string(),
            },
        }
    }
}

/// Driver for the oscilloscope and its built-in waveform generator.
pub struct Oscilloscope {
    channel: Box<dyn CommandChannel>,
}

impl Oscilloscope {
    pub fn new(channel: Box<dyn CommandChannel>) -> Self {
        Self { channel }
    }

    pub fn name(&self) -> &str {
        self.channel.name()
    }

    /// Issues one configuration command.
    pub async fn command(&self, command: ScopeCommand) -> BenchResult<()> {
        let wire = command.scpi();
        debug!("{}: {:?} -> {}", self.name(), command, wire);
        self.channel.send(&wire).await
    }

    async fn query_scalar(&self, query: ScopeQuery) -> BenchResult<f64> {
        let reply = self.channel.query(&query.scpi()).await?;
        parse_scalar(self.name(), &reply)
    }

    /// RMS voltage on a vertical channel.
    pub async fn measure_vrms(&self, channel: u8) -> BenchResult<Sample> {
        let value = self
            .query_scalar(ScopeQuery::MeasureVrms { channel })
            .await?;
        Ok(Sample::new(value, Unit::Volt))
    }

    /// Phase of `channel` relative to `reference`, in degrees.
    pub async fn measure_phase(&self, channel: u8, reference: u8) -> BenchResult<Sample> {
        let value = self
            .query_scalar(ScopeQuery::MeasurePhase { channel, reference })
            .await?;
        Ok(Sample::new(value, Unit::Degree))
    }

    /// Reads back the generator's programmed frequency in Hz.
    pub async fn generator_frequency(&self) -> BenchResult<f64> {
        self.query_scalar(ScopeQuery::GeneratorFrequency).await
    }

    /// Amplitude under an FFT marker, in dBV.
    pub async fn marker_amplitude(&self, marker: Marker) -> BenchResult<Sample> {
        let value = self
            .query_scalar(ScopeQuery::MarkerAmplitude { marker })
            .await?;
        Ok(Sample::new(value, Unit::DecibelVolt))
    }

    pub async fn close(&self) -> BenchResult<()> {
        self.channel.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_forms() {
        assert_eq!(
            ScopeCommand::ProbeScale {
                channel: 1,
                factor: 1.0
            }
            .scpi(),
            "CHANnel1:PROBe +1.0"
        );
        assert_eq!(ScopeCommand::TriggerSweepAuto.scpi(), ":TRIG:SWEep AUTO");
        assert_eq!(
            ScopeCommand::TriggerEdgeLevel { volts: 0.0 }.scpi(),
            ":TRIG:EDGE:LEVel +0.0"
        );
        assert_eq!(
            ScopeCommand::GeneratorOutput { on: false }.scpi(),
            ":WGEN:OUTP OFF"
        );
        assert_eq!(
            ScopeCommand::TimebaseScale {
                seconds_per_div: 5.0e-8
            }
            .scpi(),
            ":TIMebase:SCAL +5.0E-8"
        );
        assert_eq!(
            ScopeCommand::ChannelCoupling {
                channel: 1,
                coupling: Coupling::Ac
            }
            .scpi(),
            ":CHAN1:COUP AC"
        );
        assert_eq!(
            ScopeCommand::MarkerSourceFft { marker: Marker::X2 }.scpi(),
            ":MARKer:X2Y2source FFT"
        );
    }

    #[test]
    fn test_frequency_commands_use_scientific_notation() {
        let wire = ScopeCommand::GeneratorFrequency { hz: 1.4e7 }.scpi();
        assert_eq!(wire, ":WGEN:FREQ 1.400000E7");

        let wire = ScopeCommand::MarkerPosition {
            marker: Marker::X1,
            hz: 2.8e7,
        }
        .scpi();
        assert_eq!(wire, ":MARKer:X1P 2.800000E7");
    }

    #[test]
    fn test_query_wire_forms() {
        assert_eq!(
            ScopeQuery::MeasureVrms { channel: 1 }.scpi(),
            ":MEAS:VRMS? CHAN1"
        );
        assert_eq!(
            ScopeQuery::MeasurePhase {
                channel: 1,
                reference: 2
            }
            .scpi(),
            ":MEAS:PHAS? CHAN1,CHAN2"
        );
        assert_eq!(ScopeQuery::GeneratorFrequency.scpi(), "WGEN:FREQ?");
        assert_eq!(
            ScopeQuery::MarkerAmplitude { marker: Marker::X1 }.scpi(),
            ":MARK:Y1P?"
        );
    }
}
