//! Diagnostic Rule Catalog

use crate::{EngineError, EquipmentStatus, ParseError, Severity};
use sensor_facts::{FactSet, SensorType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Stable identifier of a diagnostic rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    CriticalBearingFailure,
    HighTemperatureWarning,
    ExcessiveVibrationWarning,
    AbnormalCurrentWarning,
    PreventiveMaintenanceNeeded,
    SystemicFailureCritical,
    LoadProblemWarning,
    SensorCalibrationWarning,
}

impl RuleId {
    /// Every rule, in catalog order
    pub const ALL: [RuleId; 8] = [
        RuleId::CriticalBearingFailure,
        RuleId::HighTemperatureWarning,
        RuleId::ExcessiveVibrationWarning,
        RuleId::AbnormalCurrentWarning,
        RuleId::PreventiveMaintenanceNeeded,
        RuleId::SystemicFailureCritical,
        RuleId::LoadProblemWarning,
        RuleId::SensorCalibrationWarning,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::CriticalBearingFailure => "critical_bearing_failure",
            RuleId::HighTemperatureWarning => "high_temperature_warning",
            RuleId::ExcessiveVibrationWarning => "excessive_vibration_warning",
            RuleId::AbnormalCurrentWarning => "abnormal_current_warning",
            RuleId::PreventiveMaintenanceNeeded => "preventive_maintenance_needed",
            RuleId::SystemicFailureCritical => "systemic_failure_critical",
            RuleId::LoadProblemWarning => "load_problem_warning",
            RuleId::SensorCalibrationWarning => "sensor_calibration_warning",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| ParseError::new("rule id", s))
    }
}

/// Threshold comparison applied to a single reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    /// `value > threshold`
    Above(f64),
    /// `value < threshold`
    Below(f64),
    /// `low < value <= high`
    Within { low: f64, high: f64 },
    /// `value < low || value > high`
    Outside { low: f64, high: f64 },
}

impl Comparison {
    /// Check a reading against this comparison
    pub fn holds(&self, value: f64) -> bool {
        match *self {
            Comparison::Above(threshold) => value > threshold,
            Comparison::Below(threshold) => value < threshold,
            Comparison::Within { low, high } => low < value && value <= high,
            Comparison::Outside { low, high } => value < low || value > high,
        }
    }
}

/// Comparison bound to one sensor type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predicate {
    pub sensor: SensorType,
    pub comparison: Comparison,
}

impl Predicate {
    pub fn new(sensor: SensorType, comparison: Comparison) -> Self {
        Self { sensor, comparison }
    }

    /// False when the sensor is absent from the fact set
    pub fn matches(&self, facts: &FactSet) -> bool {
        facts
            .get(self.sensor)
            .is_some_and(|value| self.comparison.holds(value))
    }
}

/// A diagnostic rule: conjunction of predicates plus alert metadata
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDefinition {
    pub id: RuleId,
    pub predicates: Vec<Predicate>,
    pub severity: Severity,
    pub title: &'static str,
    pub description: String,
    /// Status this rule escalates the equipment to, if any
    pub escalates_to: Option<EquipmentStatus>,
}

impl RuleDefinition {
    /// Whether every predicate holds for the fact set
    pub fn matches(&self, facts: &FactSet) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(facts))
    }

    /// Sensor types referenced by this rule
    pub fn sensors(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.predicates.iter().map(|predicate| predicate.sensor)
    }
}

/// Rule thresholds. Defaults are the plant's standard limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleThresholds {
    /// Lower bound of the high temperature band (°C)
    pub temperature_warning: f64,
    /// Bearing failure temperature (°C)
    pub temperature_critical: f64,
    /// Excessive vibration (mm/s)
    pub vibration_warning: f64,
    /// Bearing failure vibration (mm/s)
    pub vibration_critical: f64,
    /// Normal current band (A)
    pub current_min: f64,
    pub current_max: f64,
    /// Runtime before preventive maintenance (hours)
    pub runtime_maintenance: f64,
    /// Systemic failure limits
    pub systemic_temperature: f64,
    pub systemic_vibration: f64,
    pub systemic_current: f64,
    /// Load problem: vibration below, current above
    pub load_vibration_max: f64,
    pub load_current_min: f64,
    /// Calibration drift: variances below
    pub calibration_temperature_variance: f64,
    pub calibration_vibration_variance: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            temperature_warning: 70.0,
            temperature_critical: 85.0,
            vibration_warning: 2.5,
            vibration_critical: 3.0,
            current_min: 5.0,
            current_max: 50.0,
            runtime_maintenance: 2000.0,
            systemic_temperature: 75.0,
            systemic_vibration: 2.0,
            systemic_current: 45.0,
            load_vibration_max: 0.5,
            load_current_min: 40.0,
            calibration_temperature_variance: 0.1,
            calibration_vibration_variance: 0.05,
        }
    }
}

impl RuleThresholds {
    /// Reject non-finite thresholds and inverted bands
    pub fn validate(&self) -> Result<(), EngineError> {
        let values = [
            ("temperature_warning", self.temperature_warning),
            ("temperature_critical", self.temperature_critical),
            ("vibration_warning", self.vibration_warning),
            ("vibration_critical", self.vibration_critical),
            ("current_min", self.current_min),
            ("current_max", self.current_max),
            ("runtime_maintenance", self.runtime_maintenance),
            ("systemic_temperature", self.systemic_temperature),
            ("systemic_vibration", self.systemic_vibration),
            ("systemic_current", self.systemic_current),
            ("load_vibration_max", self.load_vibration_max),
            ("load_current_min", self.load_current_min),
            ("calibration_temperature_variance", self.calibration_temperature_variance),
            ("calibration_vibration_variance", self.calibration_vibration_variance),
        ];
        if let Some((name, value)) = values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(EngineError::Config(format!(
                "threshold {} must be finite, got {}",
                name, value
            )));
        }
        if self.temperature_warning >= self.temperature_critical {
            return Err(EngineError::Config(format!(
                "temperature_warning {} must be below temperature_critical {}",
                self.temperature_warning, self.temperature_critical
            )));
        }
        if self.current_min >= self.current_max {
            return Err(EngineError::Config(format!(
                "current_min {} must be below current_max {}",
                self.current_min, self.current_max
            )));
        }
        Ok(())
    }
}

/// Ordered, immutable list of diagnostic rules
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCatalog {
    rules: Vec<RuleDefinition>,
}

impl RuleCatalog {
    /// Catalog with the standard thresholds
    pub fn standard() -> Self {
        Self::build(&RuleThresholds::default())
    }

    /// Catalog with custom thresholds
    pub fn from_thresholds(thresholds: &RuleThresholds) -> Result<Self, EngineError> {
        thresholds.validate()?;
        Ok(Self::build(thresholds))
    }

    fn build(t: &RuleThresholds) -> Self {
        use Comparison::*;
        use SensorType::*;

        let rules = vec![
            RuleDefinition {
                id: RuleId::CriticalBearingFailure,
                predicates: vec![
                    Predicate::new(Temperature, Above(t.temperature_critical)),
                    Predicate::new(Vibration, Above(t.vibration_critical)),
                ],
                severity: Severity::Critical,
                title: "CRITICAL BEARING FAILURE",
                description: format!(
                    "Temperature above {} °C and vibration above {} mm/s detected. \
                     Imminent risk of catastrophic failure.",
                    t.temperature_critical, t.vibration_critical
                ),
                escalates_to: Some(EquipmentStatus::Critical),
            },
            RuleDefinition {
                id: RuleId::HighTemperatureWarning,
                predicates: vec![Predicate::new(
                    Temperature,
                    Within {
                        low: t.temperature_warning,
                        high: t.temperature_critical,
                    },
                )],
                severity: Severity::Warning,
                title: "High Temperature",
                description: format!(
                    "Temperature between {} °C and {} °C. Check the cooling system.",
                    t.temperature_warning, t.temperature_critical
                ),
                escalates_to: Some(EquipmentStatus::Warning),
            },
            RuleDefinition {
                id: RuleId::ExcessiveVibrationWarning,
                predicates: vec![Predicate::new(Vibration, Above(t.vibration_warning))],
                severity: Severity::Warning,
                title: "Excessive Vibration",
                description: format!(
                    "Vibration above {} mm/s. Possible misalignment or imbalance.",
                    t.vibration_warning
                ),
                escalates_to: Some(EquipmentStatus::Warning),
            },
            RuleDefinition {
                id: RuleId::AbnormalCurrentWarning,
                predicates: vec![Predicate::new(
                    Current,
                    Outside {
                        low: t.current_min,
                        high: t.current_max,
                    },
                )],
                severity: Severity::Warning,
                title: "Abnormal Electrical Current",
                description: format!(
                    "Current outside the normal range ({} A - {} A). \
                     Check the motor and electrical connections.",
                    t.current_min, t.current_max
                ),
                escalates_to: None,
            },
            RuleDefinition {
                id: RuleId::PreventiveMaintenanceNeeded,
                predicates: vec![Predicate::new(Runtime, Above(t.runtime_maintenance))],
                severity: Severity::Info,
                title: "Preventive Maintenance Recommended",
                description: format!(
                    "Equipment has run for more than {} hours. \
                     Schedule lubrication and inspection.",
                    t.runtime_maintenance
                ),
                escalates_to: None,
            },
            RuleDefinition {
                id: RuleId::SystemicFailureCritical,
                predicates: vec![
                    Predicate::new(Temperature, Above(t.systemic_temperature)),
                    Predicate::new(Vibration, Above(t.systemic_vibration)),
                    Predicate::new(Current, Above(t.systemic_current)),
                ],
                severity: Severity::Critical,
                title: "SYSTEMIC FAILURE DETECTED",
                description: format!(
                    "Temperature above {} °C, vibration above {} mm/s and current above {} A. \
                     Immediate shutdown recommended to prevent damage.",
                    t.systemic_temperature, t.systemic_vibration, t.systemic_current
                ),
                escalates_to: Some(EquipmentStatus::Critical),
            },
            RuleDefinition {
                id: RuleId::LoadProblemWarning,
                predicates: vec![
                    Predicate::new(Vibration, Below(t.load_vibration_max)),
                    Predicate::new(Current, Above(t.load_current_min)),
                ],
                severity: Severity::Warning,
                title: "Load Problem Detected",
                description: format!(
                    "Vibration below {} mm/s with current above {} A \
                     indicates possible jamming or overload.",
                    t.load_vibration_max, t.load_current_min
                ),
                escalates_to: None,
            },
            RuleDefinition {
                id: RuleId::SensorCalibrationWarning,
                predicates: vec![
                    Predicate::new(
                        TemperatureVariance,
                        Below(t.calibration_temperature_variance),
                    ),
                    Predicate::new(VibrationVariance, Below(t.calibration_vibration_variance)),
                ],
                severity: Severity::Info,
                title: "Check Sensor Calibration",
                description:
                    "Abnormally low variance. Sensors may be out of calibration or failing."
                        .to_string(),
                escalates_to: None,
            },
        ];

        info!("Rule catalog built with {} rules", rules.len());
        Self { rules }
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[RuleDefinition] {
        &self.rules
    }

    /// Look up a rule by id
    pub fn get(&self, id: RuleId) -> Option<&RuleDefinition> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.iter()
    }

    /// Rules that reference a sensor type outside `supplied` and so can
    /// never fire for readings from that producer
    pub fn unsupplied_rules<'a>(
        &'a self,
        supplied: &'a [SensorType],
    ) -> impl Iterator<Item = &'a RuleDefinition> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.sensors().any(|sensor| !supplied.contains(&sensor)))
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
