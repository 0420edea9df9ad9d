//! Programmable DC supply driver.
//!
//! All commands address one output channel (the amplifier's bias rail,
//! channel 2 on the commissioned bench). Command enums own the wire syntax;
//! the measurement primitives issue exactly one query each and parse one
//! numeric scalar.

use crate::error::BenchResult;
use crate::instrument::{on_off, parse_scalar, CommandChannel};
use crate::measure::{Sample, Unit};
use log::debug;

/// Configuration and action commands understood by the supply.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SupplyCommand {
    Voltage { volts: f64 },
    CurrentLimit { amps: f64 },
    Output { on: bool },
    OvercurrentProtection { on: bool },
}

impl SupplyCommand {
    /// Serializes the command for the given output channel.
    pub fn scpi(&self, channel: u8) -> String {
        match *self {
            SupplyCommand::Voltage { volts } => format!("VOLT {volts}, (@{channel})"),
            SupplyCommand::CurrentLimit { amps } => format!("CURR {amps}, (@{channel})"),
            SupplyCommand::Output { on } => format!("OUTP {}, (@{channel})", on_off(on)),
            SupplyCommand::OvercurrentProtection { on } => {
                format!("CURR:PROT:STAT {}, (@{channel})", on_off(on))
            }
        }
    }
}

/// Queries returning a single numeric scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplyQuery {
    VoltageSetpoint,
    MeasureCurrent,
}

impl SupplyQuery {
    pub fn scpi(&self, channel: u8) -> String {
        match *self {
            SupplyQuery::VoltageSetpoint => format!("VOLT? (@{channel})"),
            SupplyQuery::MeasureCurrent => format!("MEAS:CURR? CH{channel}"),
        }
    }
}

/// Driver for the programmable DC supply.
pub struct PowerSupply {
    channel: Box<dyn CommandChannel>,
    output_channel: u8,
}

impl PowerSupply {
    pub fn new(channel: Box<dyn CommandChannel>, output_channel: u8) -> Self {
        Self {
            channel,
            output_channel,
        }
    }

    pub fn name(&self) -> &str {
        self.channel.name()
    }

    /// Issues one configuration command to the output channel.
    pub async fn command(&self, command: SupplyCommand) -> BenchResult<()> {
        let wire = command.scpi(self.output_channel);
        debug!("{}: {:?} -> {}", self.name(), command, wire);
        self.channel.send(&wire).await
    }

    async fn query_scalar(&self, query: SupplyQuery) -> BenchResult<f64> {
        let reply = self.channel.query(&query.scpi(self.output_channel)).await?;
        parse_scalar(self.name(), &reply)
    }

    /// Programmed output voltage in volts.
    pub async fn voltage_setpoint(&self) -> BenchResult<Sample> {
        let value = self.query_scalar(SupplyQuery::VoltageSetpoint).await?;
        Ok(Sample::new(value, Unit::Volt))
    }

    /// Measured output current in amperes.
    pub async fn measure_current(&self) -> BenchResult<Sample> {
        let value = self.query_scalar(SupplyQuery::MeasureCurrent).await?;
        Ok(Sample::new(value, Unit::Ampere))
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
            SupplyCommand::Voltage { volts: 12.0 }.scpi(2),
            "VOLT 12, (@2)"
        );
        assert_eq!(
            SupplyCommand::CurrentLimit { amps: 0.3 }.scpi(2),
            "CURR 0.3, (@2)"
        );
        assert_eq!(SupplyCommand::Output { on: true }.scpi(2), "OUTP ON, (@2)");
        assert_eq!(
            SupplyCommand::OvercurrentProtection { on: false }.scpi(2),
            "CURR:PROT:STAT OFF, (@2)"
        );
    }

    #[test]
    fn test_query_wire_forms() {
        assert_eq!(SupplyQuery::VoltageSetpoint.scpi(2), "VOLT? (@2)");
        assert_eq!(SupplyQuery::MeasureCurrent.scpi(2), "MEAS:CURR? CH2");
    }
}
