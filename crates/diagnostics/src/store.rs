//! Equipment and Alert Store Contract

use crate::{Alert, EquipmentId, EquipmentStatus, StoreError};
use async_trait::async_trait;

/// Persistence collaborator for the diagnostic engine.
///
/// Implementations must make `compare_and_set_status` and
/// `commit_evaluation` atomic per equipment.
#[async_trait]
pub trait DiagnosticStore: Send + Sync {
    /// Current status of an equipment
    async fn get_status(&self, equipment_id: EquipmentId) -> Result<EquipmentStatus, StoreError>;

    /// Set `new` only if the status is still `expected`
    async fn compare_and_set_status(
        &self,
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
        new: EquipmentStatus,
    ) -> Result<bool, StoreError>;

    /// Append a batch of alerts, all or nothing
    async fn append_alerts(
        &self,
        equipment_id: EquipmentId,
        alerts: &[Alert],
    ) -> Result<(), StoreError>;

    /// Apply one evaluation as a unit: when `new_status` is set, compare-and-set
    /// it against `expected`, then append `alerts`.
    ///
    /// Returns `Ok(false)` with nothing written when the status no longer
    /// matches `expected`.
    async fn commit_evaluation(
        &self,
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
        new_status: Option<EquipmentStatus>,
        alerts: &[Alert],
    ) -> Result<bool, StoreError>;
}
