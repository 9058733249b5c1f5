//! Status Escalation

use crate::{EquipmentStatus, RuleDefinition};

/// Highest escalation target among the triggered rules, applied only when it
/// outranks `current`. Never downgrades, and leaves `Maintenance` untouched.
pub fn escalate(current: EquipmentStatus, triggered: &[&RuleDefinition]) -> EquipmentStatus {
    let Some(current_priority) = current.priority() else {
        return current;
    };

    triggered
        .iter()
        .filter_map(|rule| rule.escalates_to)
        .filter_map(|status| status.priority().map(|priority| (priority, status)))
        .max_by_key(|(priority, _)| *priority)
        .filter(|(priority, _)| *priority > current_priority)
        .map_or(current, |(_, status)| status)
}
