//! # opspace-run
//!
//! Runs a control scenario in simulation and prints the final tracking
//! errors of every task.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use opspace_runner::{run_scenario, Scenario};

/// Prioritized operational-space control in simulation
#[derive(Parser, Debug)]
#[command(name = "opspace-run")]
#[command(version)]
#[command(about = "Run a prioritized task-control scenario in simulation")]
struct Args {
    /// Scenario TOML file
    scenario: Option<PathBuf>,

    /// Run the built-in two-level arm scenario
    #[arg(long, conflicts_with = "scenario")]
    demo: bool,

    /// Override the tick count derived from the scenario duration
    #[arg(long)]
    ticks: Option<usize>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(&args.log_level);

    let scenario = match (&args.scenario, args.demo) {
        (_, true) => Scenario::demo().context("built-in demo scenario")?,
        (Some(path), false) => Scenario::load(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        (None, false) => bail!("no scenario given (pass a file or --demo)"),
    };
    info!(robot = %scenario.robot.name, "scenario loaded");

    let summary = run_scenario(&scenario, args.ticks).context("running scenario")?;
    print!("{summary}");
    if summary.failed_ticks > 0 {
        bail!("{} control ticks failed", summary.failed_ticks);
    }
    Ok(())
}

fn setup_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
