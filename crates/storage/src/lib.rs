//! Storage Layer
//!
//! Equipment status and alert persistence behind the `DiagnosticStore`
//! contract, with in-memory and SQLite backends.

mod memory;
mod sqlite;
mod store;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{StorageConfig, Store};

use diagnostics::Alert;
use serde::{Deserialize, Serialize};

/// Persisted alert with its store-assigned id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAlert {
    pub id: i64,
    pub acknowledged: bool,
    #[serde(flatten)]
    pub alert: Alert,
}
