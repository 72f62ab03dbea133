//! In-memory notification store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::NotificationStore;
use crate::error::StoreError;
use crate::record::{NotificationId, NotificationRecord, ReadFilter};

/// Insertion-ordered records with an id index.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordTable {
    records: Vec<NotificationRecord>,
    index: HashMap<NotificationId, usize>,
}

impl RecordTable {
    pub(crate) fn from_records(records: Vec<NotificationRecord>) -> Result<Self, StoreError> {
        let mut table = Self::default();
        for record in records {
            let Some(id) = record.id.clone() else {
                return Err(StoreError::Corrupted {
                    reason: "persisted record without id".to_string(),
                });
            };
            if table.index.insert(id.clone(), table.records.len()).is_some() {
                return Err(StoreError::Corrupted {
                    reason: format!("duplicate record id {id}"),
                });
            }
            table.records.push(record);
        }
        Ok(table)
    }

    /// Assigns an id if needed and inserts or replaces the record.
    pub(crate) fn upsert(&mut self, mut record: NotificationRecord) -> NotificationRecord {
        let id = record.id.get_or_insert_with(NotificationId::generate).clone();
        match self.index.get(&id) {
            Some(&slot) => self.records[slot] = record.clone(),
            None => {
                self.index.insert(id, self.records.len());
                self.records.push(record.clone());
            }
        }
        record
    }

    pub(crate) fn get(&self, id: &NotificationId) -> Option<&NotificationRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub(crate) fn filtered<'a>(
        &'a self,
        predicate: impl Fn(&NotificationRecord) -> bool + 'a,
    ) -> impl Iterator<Item = &'a NotificationRecord> + 'a {
        self.records.iter().filter(move |r| predicate(r))
    }

    pub(crate) fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

/// Store that keeps records in process memory.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    table: RwLock<RecordTable>,
}

impl InMemoryNotificationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn save(&self, record: NotificationRecord) -> Result<NotificationRecord, StoreError> {
        Ok(self.table.write().upsert(record))
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
