use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use fishledger_cli::{Scenario, run};
use fishledger_observability::tracing::LogFormat;

/// Replay a day of stock operations against an in-memory ledger.
#[derive(Debug, Parser)]
#[command(name = "fishledger")]
#[command(version)]
struct Cli {
    /// Scenario file (JSON).
    scenario: PathBuf,

    /// Log output format, `json` or `pretty`. Falls back to
    /// FISHLEDGER_LOG_FORMAT.
    #[arg(long)]
    log_format: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.log_format.as_deref() {
        Some(format) => fishledger_observability::tracing::init_with(LogFormat::parse(Some(format))),
        None => fishledger_observability::init(),
    }

    let path = cli.scenario.display();
    let raw = std::fs::read_to_string(&cli.scenario).with_context(|| format!("failed to read {path}"))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse {path}"))?;

    tracing::info!(path = %path, steps = scenario.steps.len(), "replaying scenario");
    let report = run(scenario)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
