//! Equipment Monitor
//!
//! Loads configuration, installs logging, and evaluates one set of sensor
//! readings against the diagnostic rules.

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use diagnostics::{DiagnosticEngine, EngineConfig, EquipmentId, EvaluationOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use storage::{StorageConfig, Store};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Max log level (default: info)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    pub engine: EngineConfig,
    pub storage: StorageConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            engine: EngineConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from an optional config file (any format the `config` crate
    /// detects from the extension), then `MONITOR_*` environment variables
    pub fn load(file: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("MONITOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

/// Initialize logging to stderr
pub fn init_logging(config: &MonitorConfig) -> anyhow::Result<()> {
    let level = Level::from_str(&config.log_level)
        .with_context(|| format!("invalid log level '{}'", config.log_level))?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Evaluate a JSON object of `sensor name -> value` readings for one equipment
pub async fn run(
    config: &MonitorConfig,
    equipment_id: EquipmentId,
    readings_json: &str,
) -> anyhow::Result<EvaluationOutcome> {
    let readings: BTreeMap<String, f64> =
        serde_json::from_str(readings_json).context("readings must be a JSON object of numbers")?;

    let store = Store::open(&config.storage).await?;
    let status = store
        .ensure_equipment(equipment_id, &format!("equipment-{}", equipment_id))
        .await?;
    info!(
        "Evaluating {} readings for equipment {} (status {})",
        readings.len(),
        equipment_id,
        status
    );

    let engine = DiagnosticEngine::with_config(store, config.engine.clone())?;
    let outcome = engine
        .evaluate_readings(
            equipment_id,
            readings.iter().map(|(name, value)| (name.as_str(), *value)),
        )
        .await?;
    Ok(outcome)
}
