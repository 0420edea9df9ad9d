//! `pa-bench` binary: wires the transports, gate, and sink together and
//! runs one characterization session.

use clap::Parser;
use log::{error, info, warn};
use pa_bench::config::Settings;
use pa_bench::error::{BenchError, BenchResult};
use pa_bench::gate::{AutoProceedGate, OperatorGate, StdinGate};
use pa_bench::instrument::mock::MockBench;
use pa_bench::instrument::scope::Oscilloscope;
use pa_bench::instrument::supply::PowerSupply;
use pa_bench::instrument::tcp::TcpChannel;
use pa_bench::instrument::CommandChannel;
use pa_bench::session::Session;
use pa_bench::sink::DirectorySink;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// RF power-amplifier bench characterization.
#[derive(Parser, Debug)]
#[command(name = "pa-bench", version, about)]
struct Cli {
    /// Path to a TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Oscilloscope SCPI socket address (host:port), overriding settings.
    #[arg(long)]
    scope: Option<String>,

    /// DC supply SCPI socket address (host:port), overriding settings.
    #[arg(long)]
    supply: Option<String>,

    /// Result output directory, overriding settings.
    #[arg(short, long)]
    output: Option<String>,

    /// Run against the simulated bench instead of real instruments.
    #[arg(long)]
    mock: bool,

    /// Answer the maximum-power sweep confirmation automatically.
    #[arg(short = 'y', long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {
            info!("bench session completed");
            ExitCode::SUCCESS
        }
        Err(BenchError::UserAbort) => {
            warn!("bench session terminated by operator");
            ExitCode::from(2)
        }
        Err(err) => {
            error!("bench session failed: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> BenchResult<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(scope) = cli.scope {
        settings.instruments.scope_resource = scope;
    }
    if let Some(supply) = cli.supply {
        settings.instruments.supply_resource = supply;
    }
    if let Some(output) = cli.output {
        settings.storage.output_dir = output;
    }

    let (scope_channel, supply_channel): (Box<dyn CommandChannel>, Box<dyn CommandChannel>) =
        if cli.mock {
            info!("running against the simulated bench");
            let bench = MockBench::new();
            (
                Box::new(bench.scope_channel()),
                Box::new(bench.supply_channel()),
            )
        } else {
            let io_timeout = Duration::from_secs_f64(settings.instruments.io_timeout_s);
            let scope =
                TcpChannel::connect("scope", &settings.instruments.scope_resource, io_timeout)
                    .await?;
            let supply =
                TcpChannel::connect("supply", &settings.instruments.supply_resource, io_timeout)
                    .await?;
            (Box::new(scope), Box::new(supply))
        };

    let scope = Oscilloscope::new(scope_channel);
    let supply = PowerSupply::new(supply_channel, settings.instruments.supply_channel);
    let sink = Box::new(DirectorySink::new(&settings.storage.output_dir)?);
    let gate: Box<dyn OperatorGate> = if cli.yes {
        Box::new(AutoProceedGate)
    } else {
        Box::new(StdinGate::stdin())
    };

    let mut session = Session::new(scope, supply, sink, gate, settings);
    session.run().await
}
