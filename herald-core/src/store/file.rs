//! JSON snapshot notification store.
//!
//! The whole record set is written to a temporary sibling file, synced and
//! renamed over the snapshot on every save. The in-memory view only changes after
//! the rename succeeds, so a failed write leaves the previous state intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::NotificationStore;
use super::memory::RecordTable;
use crate::error::StoreError;
use crate::record::{NotificationId, NotificationRecord, ReadFilter};

/// Store persisted as a JSON array on disk.
#[derive(Debug)]
pub struct FileNotificationStore {
    path: PathBuf,
    table: RwLock<RecordTable>,
    /// Serializes writers so snapshots land in call order.
    writer: Mutex<()>,
}

impl FileNotificationStore {
    /// Opens the snapshot at `path`, creating parent directories as needed.
    /// A missing file is treated as an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io("create_dir", parent, e))?;
        }

        let table = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => RecordTable::default(),
            Ok(bytes) => {
                let records: Vec<NotificationRecord> = serde_json::from_slice(&bytes)?;
                RecordTable::from_records(records)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RecordTable::default(),
            Err(e) => return Err(StoreError::io("read", &path, e)),
        };

        info!(path = %path.display(), records = table.len(), "Opened notification snapshot");

        Ok(Self {
            path,
            table: RwLock::new(table),
            writer: Mutex::new(()),
        })
    }

    /// Returns the snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn persist(&self, table: &RecordTable) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(table.records())?;
        let temp = self.temp_path();

        if let Err(e) = self.replace_snapshot(&temp, &bytes).await {
            match tokio::fs::remove_file(&temp).await {
                Ok(()) => debug!(path = %temp.display(), "Removed partial snapshot"),
                Err(rm) if rm.kind() == std::io::ErrorKind::NotFound => {}
                Err(rm) => warn!(path = %temp.display(), error = %rm, "Failed to remove partial snapshot"),
            }
            return Err(e);
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), "Snapshot written");
        Ok(())
    }

    async fn replace_snapshot(&self, temp: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut file = tokio::fs::File::create(temp)
            .await
            .map_err(|e| StoreError::io("create", temp, e))?;
        file.write_all(bytes)
            .await
            .map_err(|e| StoreError::io("write", temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| StoreError::io("sync", temp, e))?;
        drop(file);

        tokio::fs::rename(temp, &self.path)
            .await
            .map_err(|e| StoreError::io("rename", &self.path, e))
    }
}

#[async_trait]
impl NotificationStore for FileNotificationStore {
    async fn save(&self, record: NotificationRecord) -> Result<NotificationRecord, StoreError> {
        let _writer = self.writer.lock().await;

        let mut next = self.table.read().clone();
        let saved = next.upsert(record);

        if let Err(e) = self.persist(&next).await {
            error!(path = %self.path.display(), error = %e, "Failed to persist notification");
            return Err(e);
        }

        *self.table.write() = next;
        Ok(saved)
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<NotificationRecord>, StoreError> {
        Ok(self.table.read().get(id).cloned())
    }

    async fn find_by_recipient(
        &self,
        recipient_id: &str,
        filter: ReadFilter,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        Ok(self
            .table
            .read()
            .filtered(|r| r.is_owned_by(recipient_id) && filter.matches(r))
            .cloned()
            .collect())
    }

    async fn find_all(&self, filter: ReadFilter) -> Result<Vec<NotificationRecord>, StoreError> {
        Ok(self
            .table
            .read()
            .filtered(move |r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.table.read().len())
    }
}
