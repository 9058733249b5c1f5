//! Equipment Monitor - Main Entry Point
//!
//! Usage: `equipment-monitor <equipment-id> [readings.json]`
//! Readings are read from stdin when no file is given.

use anyhow::Context;
use clap::Parser;
use diagnostics::EquipmentId;
use monitor::{init_logging, run, MonitorConfig};
use std::io::Read;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "equipment-monitor")]
#[command(about = "Evaluate sensor readings against the diagnostic rules")]
#[command(version)]
struct Cli {
    /// Equipment to evaluate
    equipment_id: i64,

    /// JSON object of sensor readings (defaults to stdin)
    readings: Option<PathBuf>,

    /// Configuration file, without extension
    #[arg(short, long, env = "MONITOR_CONFIG", default_value = "monitor")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = MonitorConfig::load(&cli.config).context("failed to load configuration")?;
    init_logging(&config)?;

    info!("=== Equipment Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let readings = match &cli.readings {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let outcome = run(&config, EquipmentId(cli.equipment_id), &readings).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
