//! In-process event bus.
//!
//! Components living in the same process submit [`InboundEvent`]s through an
//! [`EventPublisher`]; [`run_event_listener`] drains the queue into
//! [`NotificationService::ingest`].

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::Validatable;
use crate::error::ConfigError;
use crate::record::InboundEvent;
use crate::service::NotificationService;

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBusConfig {
    /// Maximum number of queued events.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

const fn default_capacity() -> usize {
    1024
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Validatable for EventBusConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid_value(
                "events.capacity",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Publishing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventBusError {
    /// The listener has stopped.
    #[error("[EventBus] Listener stopped")]
    Closed,
    /// The queue is full.
    #[error("[EventBus] Queue full")]
    Full,
}

/// Cloneable handle for submitting events.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<InboundEvent>,
}

impl EventPublisher {
    /// Queues `event`, waiting for room if the queue is full.
    pub async fn publish(&self, event: InboundEvent) -> Result<(), EventBusError> {
        self.tx.send(event).await.map_err(|_| EventBusError::Closed)
    }

    /// Queues `event` without waiting.
    pub fn try_publish(&self, event: InboundEvent) -> Result<(), EventBusError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EventBusError::Full,
            mpsc::error::TrySendError::Closed(_) => EventBusError::Closed,
        })
    }
}

/// Creates a bus and returns its publisher and the listener's receiver.
#[must_use]
pub fn event_bus(config: &EventBusConfig) -> (EventPublisher, mpsc::Receiver<InboundEvent>) {
    let (tx, rx) = mpsc::channel(config.capacity.max(1));
    (EventPublisher { tx }, rx)
}

/// Ingests queued events until `shutdown` completes or every publisher is
/// dropped. Returns the number of events ingested successfully.
///
/// Ingestion failures are logged and do not stop the listener.
pub async fn run_event_listener<F>(
    service: Arc<NotificationService>,
    mut rx: mpsc::Receiver<InboundEvent>,
    shutdown: F,
) -> usize
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut ingested = 0;

    info!("Event listener started");
    loop {
        tokio::select! {
            () = &mut shutdown => {
                debug!("Event listener received shutdown");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else {
                    debug!("All publishers dropped");
                    break;
                };
                let recipient_id = event.recipient_id.clone();
                match service.ingest(event).await {
                    Ok(_) => ingested += 1,
                    Err(e) => warn!(%recipient_id, error = %e, "Failed to ingest queued event"),
                }
            }
        }
    }

    info!(ingested, "Event listener stopped");
    ingested
}
