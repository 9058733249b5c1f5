//! Validated Fact Set

use crate::{SensorType, ValidationError};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Snapshot of the latest sensor values for one equipment.
///
/// Every stored value is finite. Sensors that were not sampled are simply
/// absent; lookups for them return `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FactSet {
    values: BTreeMap<SensorType, f64>,
}

impl FactSet {
    /// Create an empty fact set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from typed readings. A repeated sensor keeps its last value.
    pub fn from_typed<I>(readings: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (SensorType, f64)>,
    {
        let mut values = BTreeMap::new();
        for (sensor, value) in readings {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite { sensor, value });
            }
            values.insert(sensor, value);
        }
        Ok(Self { values })
    }

    /// Build from raw `(name, value)` readings as reported by ingestion.
    ///
    /// Names outside the schema are skipped so newer producers can report
    /// sensors this engine does not know about yet.
    pub fn from_readings<'a, I>(readings: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let typed: Vec<(SensorType, f64)> = readings
            .into_iter()
            .filter_map(|(name, value)| match name.parse::<SensorType>() {
                Ok(sensor) => Some((sensor, value)),
                Err(_) => {
                    debug!("Ignoring unknown sensor type '{}'", name);
                    None
                }
            })
            .collect();
        Self::from_typed(typed)
    }

    /// Get the value for a sensor, if sampled
    pub fn get(&self, sensor: SensorType) -> Option<f64> {
        self.values.get(&sensor).copied()
    }

    /// Whether a sensor was sampled
    pub fn contains(&self, sensor: SensorType) -> bool {
        self.values.contains_key(&sensor)
    }

    /// Number of sampled sensors
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no sensor was sampled
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over readings in schema order
    pub fn iter(&self) -> impl Iterator<Item = (SensorType, f64)> + '_ {
        self.values.iter().map(|(sensor, value)| (*sensor, *value))
    }

    /// Sampled sensor types in schema order
    pub fn sensors(&self) -> impl Iterator<Item = SensorType> + '_ {
        self.values.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_readings_ignores_unknown_names() {
        let facts = FactSet::from_readings([("temperature", 72.5), ("humidity", 40.0)]).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts.get(SensorType::Temperature), Some(72.5));
    }

    #[test]
    fn test_rejects_nan() {
        let err = FactSet::from_readings([("vibration", f64::NAN)]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::NonFinite { sensor: SensorType::Vibration, .. }
        ));
    }

    #[test]
    fn test_rejects_infinity() {
        let err = FactSet::from_typed([
            (SensorType::Current, 12.0),
            (SensorType::Runtime, f64::NEG_INFINITY),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NonFinite {
                sensor: SensorType::Runtime,
                value: f64::NEG_INFINITY,
            }
        );
    }

    #[test]
    fn test_unknown_non_finite_is_ignored() {
        // Unknown keys never reach validation
        let facts = FactSet::from_readings([("humidity", f64::NAN)]).unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn test_last_value_wins() {
        let facts = FactSet::from_typed([
            (SensorType::Temperature, 60.0),
            (SensorType::Temperature, 88.0),
        ])
        .unwrap();
        assert_eq!(facts.get(SensorType::Temperature), Some(88.0));
    }

    #[test]
    fn test_absent_sensor() {
        let facts = FactSet::from_typed([(SensorType::Runtime, 2500.0)]).unwrap();
        assert!(!facts.contains(SensorType::Vibration));
        assert_eq!(facts.get(SensorType::Vibration), None);
    }

    #[test]
    fn test_iter_in_schema_order() {
        let facts = FactSet::from_typed([
            (SensorType::Runtime, 1.0),
            (SensorType::Temperature, 2.0),
            (SensorType::Current, 3.0),
        ])
        .unwrap();
        let sensors: Vec<_> = facts.sensors().collect();
        assert_eq!(
            sensors,
            vec![SensorType::Temperature, SensorType::Current, SensorType::Runtime]
        );
    }

    #[test]
    fn test_serializes_as_map() {
        let facts = FactSet::from_typed([(SensorType::Vibration, 0.5)]).unwrap();
        assert_eq!(serde_json::to_string(&facts).unwrap(), r#"{"vibration":0.5}"#);
    }

    fn sensor_strategy() -> impl Strategy<Value = SensorType> {
        prop::sample::select(SensorType::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_finite_readings_accepted(
            readings in prop::collection::vec((sensor_strategy(), -1.0e6f64..1.0e6), 0..12)
        ) {
            let facts = FactSet::from_typed(readings.clone()).unwrap();
            for (sensor, _) in &readings {
                prop_assert!(facts.contains(*sensor));
            }
        }

        #[test]
        fn prop_non_finite_rejected(
            sensor in sensor_strategy(),
            value in prop_oneof![Just(f64::NAN), Just(f64::INFINITY), Just(f64::NEG_INFINITY)],
        ) {
            prop_assert!(FactSet::from_typed([(sensor, value)]).is_err());
        }
    }
}
