//! Severity, Equipment Status and Identifiers

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque equipment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(pub i64);

impl From<i64> for EquipmentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alert severity, ordered `Info < Warning < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(ParseError::new("severity", other)),
        }
    }
}

/// Operational status of a piece of equipment.
///
/// `Operational`, `Warning` and `Critical` are totally ordered by priority.
/// `Maintenance` belongs to the maintenance workflow and has no priority, so
/// automated escalation never moves into or out of it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentStatus {
    #[default]
    Operational,
    Warning,
    Critical,
    Maintenance,
}

impl EquipmentStatus {
    /// Escalation priority, `None` for `Maintenance`
    pub fn priority(&self) -> Option<u8> {
        match self {
            EquipmentStatus::Operational => Some(0),
            EquipmentStatus::Warning => Some(1),
            EquipmentStatus::Critical => Some(2),
            EquipmentStatus::Maintenance => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Operational => "operational",
            EquipmentStatus::Warning => "warning",
            EquipmentStatus::Critical => "critical",
            EquipmentStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operational" => Ok(EquipmentStatus::Operational),
            "warning" => Ok(EquipmentStatus::Warning),
            "critical" => Ok(EquipmentStatus::Critical),
            "maintenance" => Ok(EquipmentStatus::Maintenance),
            other => Err(ParseError::new("equipment status", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn test_status_priority() {
        assert_eq!(EquipmentStatus::Operational.priority(), Some(0));
        assert_eq!(EquipmentStatus::Warning.priority(), Some(1));
        assert_eq!(EquipmentStatus::Critical.priority(), Some(2));
        assert_eq!(EquipmentStatus::Maintenance.priority(), None);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("maintenance".parse::<EquipmentStatus>().unwrap(), EquipmentStatus::Maintenance);
        assert!("offline".parse::<EquipmentStatus>().is_err());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(
            serde_json::to_string(&EquipmentStatus::Operational).unwrap(),
            "\"operational\""
        );
        assert_eq!(serde_json::to_string(&EquipmentId(7)).unwrap(), "7");
    }
}
