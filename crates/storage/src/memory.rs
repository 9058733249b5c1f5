//! In-Memory Store

use crate::StoredAlert;
use async_trait::async_trait;
use diagnostics::{Alert, DiagnosticStore, EquipmentId, EquipmentStatus, StoreError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug)]
struct EquipmentRecord {
    name: String,
    status: EquipmentStatus,
}

#[derive(Debug)]
struct Inner {
    equipment: HashMap<EquipmentId, EquipmentRecord>,
    alerts: Vec<StoredAlert>,
    next_alert_id: i64,
}

impl Inner {
    fn record_mut(
        &mut self,
        equipment_id: EquipmentId,
    ) -> Result<&mut EquipmentRecord, StoreError> {
        self.equipment
            .get_mut(&equipment_id)
            .ok_or(StoreError::NotFound(equipment_id))
    }

    fn push_alerts(&mut self, alerts: &[Alert]) {
        for alert in alerts {
            let id = self.next_alert_id;
            self.next_alert_id += 1;
            self.alerts.push(StoredAlert {
                id,
                acknowledged: false,
                alert: alert.clone(),
            });
        }
    }
}

/// Store keeping equipment and alerts in process memory.
///
/// A single mutex guards all state, so every commit is one critical section.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self {
            inner: Mutex::new(Inner {
                equipment: HashMap::new(),
                alerts: Vec::new(),
                next_alert_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Database(format!("Lock error: {}", e)))
    }

    /// Register a new equipment
    pub fn insert_equipment(
        &self,
        equipment_id: EquipmentId,
        name: &str,
        status: EquipmentStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.equipment.contains_key(&equipment_id) {
            return Err(StoreError::Database(format!(
                "Equipment {} already exists",
                equipment_id
            )));
        }
        inner.equipment.insert(
            equipment_id,
            EquipmentRecord {
                name: name.to_string(),
                status,
            },
        );
        Ok(())
    }

    /// Register an equipment as operational unless it already exists
    pub fn ensure_equipment(
        &self,
        equipment_id: EquipmentId,
        name: &str,
    ) -> Result<EquipmentStatus, StoreError> {
        let mut inner = self.lock()?;
        let record = inner.equipment.entry(equipment_id).or_insert_with(|| EquipmentRecord {
            name: name.to_string(),
            status: EquipmentStatus::Operational,
        });
        Ok(record.status)
    }

    /// Overwrite status unconditionally, as the maintenance workflow does
    pub fn set_status(
        &self,
        equipment_id: EquipmentId,
        status: EquipmentStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let record = inner.record_mut(equipment_id)?;
        debug!("Equipment {} ({}) status set to {}", equipment_id, record.name, status);
        record.status = status;
        Ok(())
    }

    /// Most recent alerts for an equipment, newest first
    pub fn alerts_for(
        &self,
        equipment_id: EquipmentId,
        limit: usize,
    ) -> Result<Vec<StoredAlert>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .alerts
            .iter()
            .rev()
            .filter(|stored| stored.alert.equipment_id == equipment_id)
            .take(limit)
            .cloned()
            .collect())
    }

    /// Total alert count
    pub fn alert_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.alerts.len()).unwrap_or(0)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiagnosticStore for MemoryStore {
    async fn get_status(&self, equipment_id: EquipmentId) -> Result<EquipmentStatus, StoreError> {
        let mut inner = self.lock()?;
        Ok(inner.record_mut(equipment_id)?.status)
    }

    async fn compare_and_set_status(
        &self,
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
        new: EquipmentStatus,
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let record = inner.record_mut(equipment_id)?;
        if record.status != expected {
            return Ok(false);
        }
        record.status = new;
        Ok(true)
    }

    async fn append_alerts(
        &self,
        equipment_id: EquipmentId,
        alerts: &[Alert],
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.record_mut(equipment_id)?;
        inner.push_alerts(alerts);
        debug!("Appended {} alerts for equipment {}", alerts.len(), equipment_id);
        Ok(())
    }

    async fn commit_evaluation(
        &self,
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
        new_status: Option<EquipmentStatus>,
        alerts: &[Alert],
    ) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let record = inner.record_mut(equipment_id)?;
        if let Some(new) = new_status {
            if record.status != expected {
                return Ok(false);
            }
            record.status = new;
        }
        inner.push_alerts(alerts);
        Ok(true)
    }
}
