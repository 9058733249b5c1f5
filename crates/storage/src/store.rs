//! Store Selection

use crate::{MemoryStore, SqliteStore, StoredAlert};
use async_trait::async_trait;
use diagnostics::{Alert, DiagnosticStore, EquipmentId, EquipmentStatus, StoreError};
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite URL such as `sqlite://monitor.db`; in-memory store when unset
    pub database_url: Option<String>,
}

/// Store chosen from configuration
#[derive(Debug)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    /// Open the configured backend
    pub async fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        match &config.database_url {
            Some(url) => Ok(Store::Sqlite(SqliteStore::connect(url).await?)),
            None => Ok(Store::Memory(MemoryStore::new())),
        }
    }

    /// Register an equipment as operational unless it already exists
    pub async fn ensure_equipment(
        &self,
        equipment_id: EquipmentId,
        name: &str,
    ) -> Result<EquipmentStatus, StoreError> {
        match self {
            Store::Memory(store) => store.ensure_equipment(equipment_id, name),
            Store::Sqlite(store) => store.ensure_equipment(equipment_id, name).await,
        }
    }

    /// Most recent alerts for an equipment, newest first
    pub async fn alerts_for(
        &self,
        equipment_id: EquipmentId,
        limit: usize,
    ) -> Result<Vec<StoredAlert>, StoreError> {
        match self {
            Store::Memory(store) => store.alerts_for(equipment_id, limit),
            Store::Sqlite(store) => store.alerts_for(equipment_id, limit).await,
        }
    }
}

#[async_trait]
impl DiagnosticStore for Store {
    async fn get_status(&self, equipment_id: EquipmentId) -> Result<EquipmentStatus, StoreError> {
        match self {
            Store::Memory(store) => store.get_status(equipment_id).await,
            Store::Sqlite(store) => store.get_status(equipment_id).await,
        }
    }

    async fn compare_and_set_status(
        &self,
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
        new: EquipmentStatus,
    ) -> Result<bool, StoreError> {
        match self {
            Store::Memory(store) => store.compare_and_set_status(equipment_id, expected, new).await,
            Store::Sqlite(store) => store.compare_and_set_status(equipment_id, expected, new).await,
        }
    }

    async fn append_alerts(
        &self,
        equipment_id: EquipmentId,
        alerts: &[Alert],
    ) -> Result<(), StoreError> {
        match self {
            Store::Memory(store) => store.append_alerts(equipment_id, alerts).await,
            Store::Sqlite(store) => store.append_alerts(equipment_id, alerts).await,
        }
    }

    async fn commit_evaluation(
        &self,
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
        new_status: Option<EquipmentStatus>,
        alerts: &[Alert],
    ) -> Result<bool, StoreError> {
        match self {
            Store::Memory(store) => {
                store
                    .commit_evaluation(equipment_id, expected, new_status, alerts)
                    .await
            }
            Store::Sqlite(store) => {
                store
                    .commit_evaluation(equipment_id, expected, new_status, alerts)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_opens_memory_store() {
        let store = Store::open(&StorageConfig::default()).await.unwrap();
        assert!(matches!(store, Store::Memory(_)));
        assert_eq!(
            store.ensure_equipment(EquipmentId(1), "Pump").await.unwrap(),
            EquipmentStatus::Operational
        );
    }

    #[tokio::test]
    async fn test_sqlite_url_opens_sqlite_store() {
        let config = StorageConfig {
            database_url: Some("sqlite::memory:".to_string()),
        };
        let store = Store::open(&config).await.unwrap();
        assert!(matches!(store, Store::Sqlite(_)));
    }
}
