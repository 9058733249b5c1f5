//! SQLite Store

use crate::StoredAlert;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diagnostics::{Alert, DiagnosticStore, EquipmentId, EquipmentStatus, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::str::FromStr;
use tracing::{debug, info};

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS equipment (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'operational',
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS alerts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        equipment_id INTEGER NOT NULL REFERENCES equipment(id),
        severity TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        rule_triggered TEXT NOT NULL,
        is_acknowledged INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_alerts_equipment ON alerts (equipment_id, id)",
];

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn parse_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(e.to_string())
}

/// Store backed by an SQLite database through sqlx
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and apply the schema
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("Opening SQLite store at {}", url);
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database, mainly for tests
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(db_err)?;
        // The shared-cache memory database is dropped once its last connection closes
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await.map_err(db_err)?;
        }
        Ok(Self { pool })
    }

    /// Register a new equipment
    pub async fn insert_equipment(
        &self,
        equipment_id: EquipmentId,
        name: &str,
        status: EquipmentStatus,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO equipment (id, name, status, updated_at) VALUES (?, ?, ?, ?)")
            .bind(equipment_id.0)
            .bind(name)
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Register an equipment as operational unless it already exists
    pub async fn ensure_equipment(
        &self,
        equipment_id: EquipmentId,
        name: &str,
    ) -> Result<EquipmentStatus, StoreError> {
        sqlx::query(
            "INSERT OR IGNORE INTO equipment (id, name, status, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(equipment_id.0)
        .bind(name)
        .bind(EquipmentStatus::Operational.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        self.get_status(equipment_id).await
    }

    /// Overwrite status unconditionally, as the maintenance workflow does
    pub async fn set_status(
        &self,
        equipment_id: EquipmentId,
        status: EquipmentStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE equipment SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(equipment_id.0)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(equipment_id));
        }
        debug!("Equipment {} status set to {}", equipment_id, status);
        Ok(())
    }

    /// Most recent alerts for an equipment, newest first
    pub async fn alerts_for(
        &self,
        equipment_id: EquipmentId,
        limit: usize,
    ) -> Result<Vec<StoredAlert>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, equipment_id, severity, title, description, rule_triggered, \
             is_acknowledged, created_at \
             FROM alerts WHERE equipment_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(equipment_id.0)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(stored_alert_from_row).collect()
    }

    /// Total alert count
    pub async fn alert_count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM alerts")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn exists(
        executor: &mut Transaction<'_, Sqlite>,
        equipment_id: EquipmentId,
    ) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM equipment WHERE id = ?")
            .bind(equipment_id.0)
            .fetch_optional(&mut **executor)
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn insert_alerts(
        tx: &mut Transaction<'_, Sqlite>,
        alerts: &[Alert],
    ) -> Result<(), StoreError> {
        for alert in alerts {
            sqlx::query(
                "INSERT INTO alerts \
                 (equipment_id, severity, title, description, rule_triggered, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(alert.equipment_id.0)
            .bind(alert.severity.as_str())
            .bind(&alert.title)
            .bind(&alert.description)
            .bind(alert.rule_triggered.as_str())
            .bind(alert.created_at.to_rfc3339())
            .execute(&mut **tx)
            .await
            .map_err(db_err)?;
        }
        Ok(())
    }
}

fn stored_alert_from_row(row: &SqliteRow) -> Result<StoredAlert, StoreError> {
    let severity: String = row.try_get("severity").map_err(db_err)?;
    let rule: String = row.try_get("rule_triggered").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;

    Ok(StoredAlert {
        id: row.try_get("id").map_err(db_err)?,
        acknowledged: row.try_get("is_acknowledged").map_err(db_err)?,
        alert: Alert {
            equipment_id: EquipmentId(row.try_get("equipment_id").map_err(db_err)?),
            severity: severity.parse().map_err(parse_err)?,
            title: row.try_get("title").map_err(db_err)?,
            description: row.try_get("description").map_err(db_err)?,
            rule_triggered: rule.parse().map_err(parse_err)?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map_err(parse_err)?
                .with_timezone(&Utc),
        },
    })
}

#[async_trait]
impl DiagnosticStore for SqliteStore {
    async fn get_status(&self, equipment_id: EquipmentId) -> Result<EquipmentStatus, StoreError> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM equipment WHERE id = ?")
            .bind(equipment_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        status
            .ok_or(StoreError::NotFound(equipment_id))?
            .parse()
            .map_err(parse_err)
    }

    async fn compare_and_set_status(
        &self,
        equipment_id: EquipmentId,
        expected: EquipmentStatus,
        new: EquipmentStatus,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let swapped = cas_status(&mut tx, equipment_id, expected, new).await?;
        if !swapped && !Self::exists(&mut tx, equipment_id).await? {
            return Err(StoreError::NotFound(equipment_id));
        }
        tx.commit().await.map_err(db_err)?;
        Ok(swapped)
    }

    async fn append_alerts(
        &self,
        equipment_id: EquipmentId,
        alerts: &[Alert],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        if !Self::exists(&mut tx, equipment_id).await? {
            return Err(StoreError::NotFound(equipment_id));
        }
        Self::insert_alerts(&mut tx, alerts).await?;
        tx.commit().await.map_err(db_err)?;
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
        // Dropping `tx` without commit rolls everything back
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        match new_status {
            Some(new) => {
                if !cas_status(&mut tx, equipment_id, expected, new).await? {
                    if Self::exists(&mut tx, equipment_id).await? {
                        return Ok(false);
                    }
                    return Err(StoreError::NotFound(equipment_id));
                }
            }
            None => {
                if !Self::exists(&mut tx, equipment_id).await? {
                    return Err(StoreError::NotFound(equipment_id));
                }
            }
        }
        Self::insert_alerts(&mut tx, alerts).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(true)
    }
}

async fn cas_status(
    tx: &mut Transaction<'_, Sqlite>,
    equipment_id: EquipmentId,
    expected: EquipmentStatus,
    new: EquipmentStatus,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE equipment SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(new.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(equipment_id.0)
    .bind(expected.as_str())
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagnostics::{RuleCatalog, RuleId, Severity};

    fn alert(equipment_id: EquipmentId, rule: RuleId) -> Alert {
        let catalog = RuleCatalog::standard();
        Alert::from_rule(equipment_id, catalog.get(rule).unwrap(), Utc::now())
    }

    #[tokio::test]
    async fn test_status_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .insert_equipment(EquipmentId(1), "Motor 1", EquipmentStatus::Warning)
            .await
            .unwrap();

        assert_eq!(store.get_status(EquipmentId(1)).await.unwrap(), EquipmentStatus::Warning);
        store.set_status(EquipmentId(1), EquipmentStatus::Maintenance).await.unwrap();
        assert_eq!(store.get_status(EquipmentId(1)).await.unwrap(), EquipmentStatus::Maintenance);
    }

    #[tokio::test]
    async fn test_missing_equipment() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(matches!(
            store.get_status(EquipmentId(4)).await,
            Err(StoreError::NotFound(EquipmentId(4)))
        ));
        assert!(matches!(
            store
                .compare_and_set_status(
                    EquipmentId(4),
                    EquipmentStatus::Operational,
                    EquipmentStatus::Warning,
                )
                .await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.set_status(EquipmentId(4), EquipmentStatus::Warning).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.ensure_equipment(EquipmentId(1), "Motor 1").await.unwrap();

        let swapped = store
            .compare_and_set_status(
                EquipmentId(1),
                EquipmentStatus::Warning,
                EquipmentStatus::Critical,
            )
            .await
            .unwrap();
        assert!(!swapped);
        assert_eq!(store.get_status(EquipmentId(1)).await.unwrap(), EquipmentStatus::Operational);

        let swapped = store
            .compare_and_set_status(
                EquipmentId(1),
                EquipmentStatus::Operational,
                EquipmentStatus::Critical,
            )
            .await
            .unwrap();
        assert!(swapped);
        assert_eq!(store.get_status(EquipmentId(1)).await.unwrap(), EquipmentStatus::Critical);
    }

    #[tokio::test]
    async fn test_alerts_persist_fields() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.ensure_equipment(EquipmentId(2), "Compressor").await.unwrap();
        let batch = [
            alert(EquipmentId(2), RuleId::CriticalBearingFailure),
            alert(EquipmentId(2), RuleId::ExcessiveVibrationWarning),
        ];

        store.append_alerts(EquipmentId(2), &batch).await.unwrap();

        let stored = store.alerts_for(EquipmentId(2), 10).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].alert, batch[1]);
        assert_eq!(stored[1].alert, batch[0]);
        assert_eq!(stored[1].alert.severity, Severity::Critical);
        assert!(!stored[0].acknowledged);
        assert_eq!(store.alert_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .insert_equipment(EquipmentId(1), "Motor 1", EquipmentStatus::Warning)
            .await
            .unwrap();
        let batch = [alert(EquipmentId(1), RuleId::SystemicFailureCritical)];

        let committed = store
            .commit_evaluation(
                EquipmentId(1),
                EquipmentStatus::Operational,
                Some(EquipmentStatus::Critical),
                &batch,
            )
            .await
            .unwrap();
        assert!(!committed);
        assert_eq!(store.alert_count().await.unwrap(), 0);

        let committed = store
            .commit_evaluation(
                EquipmentId(1),
                EquipmentStatus::Warning,
                Some(EquipmentStatus::Critical),
                &batch,
            )
            .await
            .unwrap();
        assert!(committed);
        assert_eq!(store.alert_count().await.unwrap(), 1);
        assert_eq!(store.get_status(EquipmentId(1)).await.unwrap(), EquipmentStatus::Critical);
    }

    #[tokio::test]
    async fn test_commit_for_missing_equipment() {
        let store = SqliteStore::in_memory().await.unwrap();
        let batch = [alert(EquipmentId(7), RuleId::LoadProblemWarning)];

        let err = store
            .commit_evaluation(EquipmentId(7), EquipmentStatus::Operational, None, &batch)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(EquipmentId(7))));
        assert_eq!(store.alert_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_alert_insert_rolls_back_status() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.ensure_equipment(EquipmentId(1), "Motor 1").await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_vibration_alerts BEFORE INSERT ON alerts \
             WHEN NEW.rule_triggered = 'excessive_vibration_warning' \
             BEGIN SELECT RAISE(ABORT, 'alert rejected'); END",
        )
        .execute(&store.pool)
        .await
        .unwrap();
        let batch = [
            alert(EquipmentId(1), RuleId::CriticalBearingFailure),
            alert(EquipmentId(1), RuleId::ExcessiveVibrationWarning),
        ];

        let err = store
            .commit_evaluation(
                EquipmentId(1),
                EquipmentStatus::Operational,
                Some(EquipmentStatus::Critical),
                &batch,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Database(_)));
        // Status UPDATE and the first INSERT ran inside the rolled-back transaction
        assert_eq!(
            store.get_status(EquipmentId(1)).await.unwrap(),
            EquipmentStatus::Operational
        );
        assert_eq!(store.alert_count().await.unwrap(), 0);
    }
}
