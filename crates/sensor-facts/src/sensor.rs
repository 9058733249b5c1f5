//! Sensor Type Schema

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sensor types sampled on monitored equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    /// Housing temperature (°C)
    Temperature,
    /// Vibration velocity (mm/s)
    Vibration,
    /// Motor current (A)
    Current,
    /// Accumulated runtime (hours)
    Runtime,
    /// Temperature variance over the sampling window
    TemperatureVariance,
    /// Vibration variance over the sampling window
    VibrationVariance,
}

impl SensorType {
    /// Every sensor type, in schema order
    pub const ALL: [SensorType; 6] = [
        SensorType::Temperature,
        SensorType::Vibration,
        SensorType::Current,
        SensorType::Runtime,
        SensorType::TemperatureVariance,
        SensorType::VibrationVariance,
    ];

    /// Get wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Vibration => "vibration",
            SensorType::Current => "current",
            SensorType::Runtime => "runtime",
            SensorType::TemperatureVariance => "temperature_variance",
            SensorType::VibrationVariance => "vibration_variance",
        }
    }

    /// Get engineering unit label
    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Vibration => "mm/s",
            SensorType::Current => "A",
            SensorType::Runtime => "hours",
            SensorType::TemperatureVariance => "°C²",
            SensorType::VibrationVariance => "(mm/s)²",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorType::ALL
            .iter()
            .copied()
            .find(|sensor| sensor.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownSensor(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        for sensor in SensorType::ALL {
            assert_eq!(sensor.as_str().parse::<SensorType>().unwrap(), sensor);
        }
    }

    #[test]
    fn test_parse_unknown_name() {
        let err = "humidity".parse::<SensorType>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownSensor("humidity".to_string()));
    }

    #[test]
    fn test_serde_uses_wire_name() {
        let json = serde_json::to_string(&SensorType::VibrationVariance).unwrap();
        assert_eq!(json, "\"vibration_variance\"");
    }

    #[test]
    fn test_units() {
        assert_eq!(SensorType::Temperature.unit(), "°C");
        assert_eq!(SensorType::Runtime.unit(), "hours");
    }
}
