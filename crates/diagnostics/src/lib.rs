//! Equipment Diagnostics
//!
//! Evaluates sensor fact sets against a fixed diagnostic rule catalog,
//! synthesizes alerts, and escalates equipment status monotonically.

mod alert;
mod engine;
mod error;
mod escalation;
mod evaluator;
mod rules;
mod status;
mod store;

pub use alert::{synthesize, Alert};
pub use engine::{DiagnosticEngine, EngineConfig, EvaluationOutcome};
pub use error::{EngineError, ParseError, StoreError};
pub use escalation::escalate;
pub use evaluator::evaluate;
pub use rules::{Comparison, Predicate, RuleCatalog, RuleDefinition, RuleId, RuleThresholds};
pub use status::{EquipmentId, EquipmentStatus, Severity};
pub use store::DiagnosticStore;

pub use sensor_facts::{FactSet, SensorType, ValidationError};
