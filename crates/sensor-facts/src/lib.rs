//! Sensor Facts
//!
//! Provides the closed sensor-type schema and validated fact sets consumed by
//! the diagnostic engine.

mod error;
mod fact_set;
mod sensor;

pub use error::ValidationError;
pub use fact_set::FactSet;
pub use sensor::SensorType;
