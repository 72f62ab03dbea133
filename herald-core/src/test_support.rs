//! Shared test doubles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::record::{NotificationId, NotificationRecord, ReadFilter};
use crate::session::{ChannelError, ChannelId, PushChannel};
use crate::store::{InMemoryNotificationStore, NotificationStore};

/// Push channel that records every frame it accepts.
#[derive(Debug)]
pub(crate) struct RecordingChannel {
    id: ChannelId,
    frames: Mutex<Vec<String>>,
    failure: Option<ChannelError>,
    delay: Option<Duration>,
    closed: AtomicBool,
}

impl RecordingChannel {
    pub(crate) fn new() -> Self {
        Self {
            id: ChannelId::generate(),
            frames: Mutex::new(Vec::new()),
            failure: None,
            delay: None,
            closed: AtomicBool::new(false),
        }
    }

    /// A channel whose every push fails with `error`.
    pub(crate) fn failing(error: ChannelError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    /// A channel whose every push stalls for `delay` first.
    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub(crate) fn frames(&self) -> Vec<String> {
        self.frames.lock().clone()
    }
}

#[async_trait]
impl PushChannel for RecordingChannel {
    fn id(&self) -> ChannelId {
        self.id
    }

    async fn push(&self, frame: String) -> Result<(), ChannelError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.frames.lock().push(frame);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Store wrapper whose saves can be switched to fail.
#[derive(Debug, Default)]
pub(crate) struct FlakyStore {
    inner: InMemoryNotificationStore,
    fail_saves: AtomicBool,
}

impl FlakyStore {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.fail_saves.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationStore for FlakyStore {
    async fn save(&self, record: NotificationRecord) -> Result<NotificationRecord, StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "disk full".to_string(),
            });
        }
        self.inner.save(record).await
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<NotificationRecord>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_recipient(
        &self,
        recipient_id: &str,
        filter: ReadFilter,
    ) -> Result<Vec<NotificationRecord>, StoreError> {
        self.inner.find_by_recipient(recipient_id, filter).await
    }

    async fn find_all(&self, filter: ReadFilter) -> Result<Vec<NotificationRecord>, StoreError> {
        self.inner.find_all(filter).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.inner.count().await
    }
}
