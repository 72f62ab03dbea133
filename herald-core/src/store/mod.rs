//! Notification persistence.
//!
//! [`NotificationStore`] is the persistence contract the service depends on.
//! Two backends ship with the crate:
//!
//! - [`InMemoryNotificationStore`] - process-lifetime storage for tests and
//!   single-node development
//! - [`FileNotificationStore`] - JSON snapshot on disk, replaced atomically on
//!   every write
//!
//! Both return records in insertion order.

mod file;
mod memory;

pub use file::FileNotificationStore;
pub use memory::InMemoryNotificationStore;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Validatable;
use crate::error::{ConfigError, StoreError};
use crate::record::{NotificationId, NotificationRecord, ReadFilter};

/// Durable keyed storage of notification records.
///
/// Implementations own their consistency; callers may share one instance
/// across tasks.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Inserts the record when `id` is unset (issuing a fresh id) or
    /// replaces the stored record with the same id. Returns the persisted
    /// state.
    async fn save(&self, record: NotificationRecord) -> Result<NotificationRecord, StoreError>;

    /// Looks up a record by id.
    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<NotificationRecord>, StoreError>;

    /// Returns the records addressed to `recipient_id` that pass `filter`.
    async fn find_by_recipient(
        &self,
        recipient_id: &str,
        filter: ReadFilter,
    ) -> Result<Vec<NotificationRecord>, StoreError>;

    /// Returns every record that passes `filter`.
    async fn find_all(&self, filter: ReadFilter) -> Result<Vec<NotificationRecord>, StoreError>;

    /// Returns the number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory.
    #[default]
    Memory,
    /// JSON snapshot file.
    File,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend to use.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Snapshot path for the file backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Validatable for StorageConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StorageBackend::File && self.path.is_none() {
            return Err(ConfigError::missing_field("storage.path"));
        }
        Ok(())
    }
}

/// Opens the backend described by `config`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn NotificationStore>, StoreError> {
    match (config.backend, &config.path) {
        (StorageBackend::Memory, _) => Ok(Arc::new(InMemoryNotificationStore::new())),
        (StorageBackend::File, Some(path)) => {
            Ok(Arc::new(FileNotificationStore::open(path.clone()).await?))
        }
        (StorageBackend::File, None) => Err(StoreError::Unavailable {
            reason: "file backend configured without a path".to_string(),
        }),
    }
}
