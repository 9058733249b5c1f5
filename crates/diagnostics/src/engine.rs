//! Diagnostic Engine

use crate::{
    escalate, evaluate, synthesize, Alert, DiagnosticStore, EngineError, EquipmentId,
    EquipmentStatus, RuleCatalog, RuleThresholds,
};
use chrono::Utc;
use metrics::counter;
use sensor_facts::{FactSet, SensorType};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rule thresholds
    pub thresholds: RuleThresholds,
    /// Sensor types the reading producer supplies
    pub supplied_sensors: Vec<SensorType>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: RuleThresholds::default(),
            supplied_sensors: vec![
                SensorType::Temperature,
                SensorType::Vibration,
                SensorType::Current,
                SensorType::Runtime,
            ],
        }
    }
}

/// Result of one evaluation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub evaluation_id: Uuid,
    pub equipment_id: EquipmentId,
    pub alerts: Vec<Alert>,
    pub previous_status: EquipmentStatus,
    pub status: EquipmentStatus,
    pub status_changed: bool,
}

/// Evaluates fact sets and commits the resulting alerts and status change
pub struct DiagnosticEngine<S> {
    catalog: RuleCatalog,
    store: S,
}

impl<S: DiagnosticStore> DiagnosticEngine<S> {
    /// Create an engine with the default configuration
    pub fn new(store: S) -> Self {
        let config = EngineConfig::default();
        let catalog = RuleCatalog::standard();
        log_dormant_rules(&catalog, &config.supplied_sensors);
        Self { catalog, store }
    }

    /// Create an engine from configuration
    pub fn with_config(store: S, config: EngineConfig) -> Result<Self, EngineError> {
        let catalog = RuleCatalog::from_thresholds(&config.thresholds)?;
        log_dormant_rules(&catalog, &config.supplied_sensors);
        Ok(Self { catalog, store })
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate raw `(sensor name, value)` readings, then evaluate them.
    /// Invalid readings fail before the store is touched.
    pub async fn evaluate_readings<'a, I>(
        &self,
        equipment_id: EquipmentId,
        readings: I,
    ) -> Result<EvaluationOutcome, EngineError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let facts = FactSet::from_readings(readings)?;
        self.evaluate(equipment_id, &facts).await
    }

    /// Evaluate a fact set for one equipment.
    ///
    /// Alerts and the status change are committed together or not at all.
    pub async fn evaluate(
        &self,
        equipment_id: EquipmentId,
        facts: &FactSet,
    ) -> Result<EvaluationOutcome, EngineError> {
        let evaluation_id = Uuid::new_v4();
        let triggered = evaluate(facts, &self.catalog);
        for rule in &triggered {
            debug!(
                "Evaluation {}: rule {} fired for equipment {}",
                evaluation_id, rule.id, equipment_id
            );
        }
        let alerts = synthesize(equipment_id, &triggered, Utc::now());

        let previous_status = self.store.get_status(equipment_id).await?;
        let status = escalate(previous_status, &triggered);
        let new_status = (status != previous_status).then_some(status);

        if !alerts.is_empty() || new_status.is_some() {
            let committed = self
                .store
                .commit_evaluation(equipment_id, previous_status, new_status, &alerts)
                .await?;
            if !committed {
                counter!("diagnostics_status_conflicts_total").increment(1);
                warn!(
                    "Evaluation {}: status of equipment {} changed from {} concurrently",
                    evaluation_id, equipment_id, previous_status
                );
                return Err(EngineError::StatusConflict {
                    equipment_id,
                    expected: previous_status,
                });
            }
            record_commit(&alerts, new_status);
        }

        info!(
            "Evaluation {} for equipment {}: {} alerts, status {} -> {}",
            evaluation_id,
            equipment_id,
            alerts.len(),
            previous_status,
            status
        );
        Ok(EvaluationOutcome {
            evaluation_id,
            equipment_id,
            alerts,
            previous_status,
            status,
            status_changed: new_status.is_some(),
        })
    }
}

fn log_dormant_rules(catalog: &RuleCatalog, supplied: &[SensorType]) {
    for rule in catalog.unsupplied_rules(supplied) {
        let missing: Vec<&str> = rule
            .sensors()
            .filter(|sensor| !supplied.contains(sensor))
            .map(|sensor| sensor.as_str())
            .collect();
        warn!(
            "Rule {} is dormant: ingestion does not supply {}",
            rule.id,
            missing.join(", ")
        );
    }
}

fn record_commit(alerts: &[Alert], new_status: Option<EquipmentStatus>) {
    for alert in alerts {
        counter!(
            "diagnostics_alerts_total",
            "severity" => alert.severity.as_str(),
            "rule" => alert.rule_triggered.as_str()
        )
        .increment(1);
    }
    if let Some(status) = new_status {
        counter!("diagnostics_status_escalations_total", "status" => status.as_str()).increment(1);
    }
}
