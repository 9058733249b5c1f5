//! Validation Error Types

use crate::SensorType;
use thiserror::Error;

/// Errors raised while building a fact set
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// NaN or infinite reading
    #[error("{sensor} value {value} is not a finite number")]
    NonFinite { sensor: SensorType, value: f64 },

    /// Sensor name outside the known schema
    #[error("Unknown sensor type: {0}")]
    UnknownSensor(String),
}
