//! Alert Synthesis

use crate::{EquipmentId, RuleDefinition, RuleId, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert raised by one rule firing for one equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub equipment_id: EquipmentId,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub rule_triggered: RuleId,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    /// Build the alert for a triggered rule
    pub fn from_rule(
        equipment_id: EquipmentId,
        rule: &RuleDefinition,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            equipment_id,
            severity: rule.severity,
            title: rule.title.to_string(),
            description: rule.description.clone(),
            rule_triggered: rule.id,
            created_at,
        }
    }
}

/// One alert per triggered rule, in the same order.
///
/// No deduplication happens here: every evaluation is a fresh sampling event
/// and gets its own batch.
pub fn synthesize(
    equipment_id: EquipmentId,
    triggered: &[&RuleDefinition],
    created_at: DateTime<Utc>,
) -> Vec<Alert> {
    triggered
        .iter()
        .map(|rule| Alert::from_rule(equipment_id, rule, created_at))
        .collect()
}
