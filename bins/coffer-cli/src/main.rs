//! coffer-cli — replay custody ledger scenarios.
//!
//! Loads a ledger configuration and a JSON scenario script, replays the
//! script against a time-lock, penalty-box or pooled-fee ledger on a
//! deterministic clock, and prints the resulting events and final state.

mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use coffer_ledger::LedgerConfig;

use crate::scenario::{Runner, Scenario, Variant};

/// Custody ledger scenario runner.
#[derive(Parser)]
#[command(name = "coffer-cli")]
#[command(version, about = "Replay deposits and withdrawals against custody ledgers.")]
struct Cli {
    /// Ledger configuration file (JSON). Defaults to the reference policies.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level filter; `RUST_LOG` takes precedence.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Log output format: `text` or `json`.
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario script.
    Run(RunArgs),
    /// Print the effective configuration.
    Policy,
}

#[derive(Args)]
struct RunArgs {
    /// Ledger variant to run against.
    #[arg(long, value_enum)]
    variant: Variant,

    /// Scenario script (JSON).
    #[arg(short, long)]
    scenario: PathBuf,

    /// Stop at the first rejected step.
    #[arg(long)]
    strict: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let config = load_config(cli.config.as_ref())?;
    match cli.command {
        Commands::Run(args) => run(&config, &args),
        Commands::Policy => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Load the config file if given, then apply the `COFFER_OWNER` override.
fn load_config(path: Option<&PathBuf>) -> Result<LedgerConfig> {
    let mut config = match path {
        Some(path) => LedgerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Ok(owner) = std::env::var("COFFER_OWNER") {
        config.owner = owner;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn run(config: &LedgerConfig, args: &RunArgs) -> Result<()> {
    let scenario = Scenario::from_file(&args.scenario)?;
    info!(variant = ?args.variant, steps = scenario.steps.len(), "starting scenario");

    let mut runner = Runner::new(args.variant, config);
    let mut rejected = 0usize;
    for (index, step) in scenario.steps.iter().enumerate() {
        match runner.apply(step) {
            Ok(event) => println!("{}", serde_json::to_string(&event)?),
            Err(e) => {
                rejected += 1;
                println!("{}", json!({ "step": index, "rejected": e.to_string() }));
                if args.strict {
                    bail!("step {index} rejected: {e}");
                }
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&runner.summary())?);
    info!(
        committed = runner.events().len(),
        rejected,
        "scenario complete"
    );
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so stdout stays machine-readable. Pass `format = "json"`
/// for structured JSON output; any other value gives human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}
