//! Notification orchestration.
//!
//! [`NotificationService`] ties the store and the dispatcher together:
//!
//! ```text
//! InboundEvent ─validate─▶ NotificationRecord ─save─▶ store
//!                                                   │
//!                                                   └─▶ dispatcher.try_deliver (outcome logged only)
//! ```
//!
//! Persistence always completes before delivery is attempted, and the
//! delivery outcome never changes the value returned to the caller.

use std::sync::Arc;

use herald_telemetry::metrics::HeraldMetrics;
use tracing::{info, instrument, warn};

use crate::dispatcher::{BroadcastReport, DeliveryDispatcher};
use crate::error::{NotificationError, NotificationResult};
use crate::principal::Principal;
use crate::record::{
    BROADCAST_RECIPIENT, InboundEvent, NotificationId, NotificationRecord, ReadFilter,
};
use crate::session::SessionRegistry;
use crate::store::NotificationStore;

/// Ingestion, history and read-state operations.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    dispatcher: Arc<DeliveryDispatcher>,
}

impl NotificationService {
    /// Composes a service from its collaborators.
    #[must_use]
    pub fn new(store: Arc<dyn NotificationStore>, dispatcher: Arc<DeliveryDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.store
    }

    /// The session registry used for delivery.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.dispatcher.registry()
    }

    /// Validates `event`, persists a new record and attempts delivery.
    ///
    /// Succeeds as soon as the record is persisted, whatever the delivery
    /// outcome.
    #[instrument(
        skip(self, event),
        fields(recipient_id = %event.recipient_id, kind = %event.kind, origin = ?event.origin)
    )]
    pub async fn ingest(&self, event: InboundEvent) -> NotificationResult<NotificationRecord> {
        if let Err(e) = event.validate() {
            HeraldMetrics::notification_rejected();
            return Err(e);
        }

        let saved = self.store.save(NotificationRecord::from(event)).await?;
        HeraldMetrics::notification_ingested();
        let outcome = self.dispatcher.try_deliver(&saved).await;

        info!(
            notification_id = ?saved.id,
            outcome = outcome.as_str(),
            "Notification ingested"
        );
        Ok(saved)
    }

    /// Returns the caller's own notifications.
    #[instrument(skip(self))]
    pub async fn history(
        &self,
        caller_id: &str,
        filter: ReadFilter,
    ) -> NotificationResult<Vec<NotificationRecord>> {
        Ok(self.store.find_by_recipient(caller_id, filter).await?)
    }

    /// Returns every notification.
    ///
    /// The administrator check belongs to the calling layer.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn all_history(
        &self,
        caller: &Principal,
        filter: ReadFilter,
    ) -> NotificationResult<Vec<NotificationRecord>> {
        Ok(self.store.find_all(filter).await?)
    }

    /// Marks one of the caller's notifications as read.
    ///
    /// Marking an already-read record returns it unchanged. A record owned by
    /// someone else yields [`NotificationError::Forbidden`] and is not touched.
    #[instrument(skip(self), fields(notification_id = %id))]
    pub async fn mark_read(
        &self,
        id: &NotificationId,
        caller_id: &str,
    ) -> NotificationResult<NotificationRecord> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| NotificationError::NotFound { id: id.clone() })?;

        if !record.is_owned_by(caller_id) {
            warn!(%caller_id, "Mark-read refused for non-owner");
            return Err(NotificationError::Forbidden { id: id.clone() });
        }

        if record.read {
            return Ok(record);
        }

        let updated = self.store.save(record.marked_read()).await?;
        HeraldMetrics::notification_read();
        info!("Notification marked read");
        Ok(updated)
    }

    /// Number of the caller's unread notifications.
    pub async fn unread_count(&self, caller_id: &str) -> NotificationResult<usize> {
        Ok(self
            .store
            .find_by_recipient(caller_id, ReadFilter::Unread)
            .await?
            .len())
    }

    /// Persists an announcement addressed to everyone and pushes it to every
    /// live session.
    #[instrument(skip(self, kind, message))]
    pub async fn announce(
        &self,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> NotificationResult<(NotificationRecord, BroadcastReport)> {
        let event = InboundEvent::new(BROADCAST_RECIPIENT, kind, message);
        event.validate_content()?;

        let saved = self.store.save(NotificationRecord::from(event)).await?;
        let report = self.dispatcher.broadcast(&saved).await;

        info!(
            notification_id = ?saved.id,
            delivered = report.delivered,
            failed = report.failed,
            "Announcement broadcast"
        );
        Ok((saved, report))
    }
}
