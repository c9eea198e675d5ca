//! discipline-admin: contract schema export and scripted replay.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use discipline_admin::{replay, ReplayOptions, Script};
use discipline_contract::{ContractMetadata, ServiceConfig};
use discipline_telemetry::{init_telemetry, TelemetryConfig};

/// Discipline escrow admin tool
#[derive(Parser, Debug)]
#[command(name = "discipline-admin")]
#[command(about = "Inspect and exercise the discipline escrow contract")]
struct Args {
    /// Log level override (otherwise DISCIPLINE_LOG_LEVEL / RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the contract descriptor as JSON
    Schema {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Deploy in memory, run a JSON script and print the report
    Replay {
        /// Script path
        script: PathBuf,

        /// Stop at the first rejected step
        #[arg(long)]
        fail_fast: bool,

        /// Include the transaction log in the report
        #[arg(long)]
        with_log: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if let Some(level) = args.log_level {
        telemetry = telemetry.with_log_level(level);
    }
    let _guard = init_telemetry(telemetry).context("failed to initialize logging")?;

    match args.command {
        Command::Schema { output } => {
            let json = ContractMetadata::describe().to_json()?;
            match output {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Replay {
            script,
            fail_fast,
            with_log,
        } => {
            let raw = fs::read_to_string(&script)
                .with_context(|| format!("failed to read {}", script.display()))?;
            let parsed = Script::from_json(&raw)
                .with_context(|| format!("invalid script {}", script.display()))?;
            let options = ReplayOptions {
                fail_fast,
                include_log: with_log,
            };
            let report = replay(&parsed, ServiceConfig::from_env(), &options).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
