//! Diagnostic Error Types

use crate::{EquipmentId, EquipmentStatus};
use sensor_facts::ValidationError;
use thiserror::Error;

/// Errors reported by equipment and alert stores
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Equipment {0} not found")]
    NotFound(EquipmentId),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the diagnostic engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Fact set rejected before evaluation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Store read or commit failed; nothing was committed
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Status changed underneath the evaluation; nothing was committed
    #[error("Status of equipment {equipment_id} changed concurrently (expected {expected})")]
    StatusConflict {
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
    },

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Failure to parse a wire name back into a domain enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
