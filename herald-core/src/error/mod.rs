//! Error types for the notification core.
//!
//! - [`NotificationError`] - failures surfaced by the notification service
//! - [`StoreError`] - persistence backend failures
//! - [`ConfigError`] - configuration loading and validation failures
//!
//! Delivery failures are not errors here. They are reported as a
//! [`DeliveryOutcome`](crate::dispatcher::DeliveryOutcome) and never leave
//! the dispatcher as an error.

mod config;
mod storage;

pub use config::ConfigError;
pub use storage::StoreError;

use thiserror::Error;

use crate::record::NotificationId;

/// Errors returned by [`NotificationService`](crate::service::NotificationService)
/// operations.
#[derive(Error, Debug)]
pub enum NotificationError {
    /// The inbound event failed validation.
    #[error("[Notification] Invalid event: {reason}")]
    Validation {
        /// Why the event was rejected.
        reason: String,
    },

    /// No record exists with the given id.
    #[error("[Notification] Not found: {id}")]
    NotFound {
        /// Requested id.
        id: NotificationId,
    },

    /// The record exists but belongs to another user.
    #[error("[Notification] Not visible to caller: {id}")]
    Forbidden {
        /// Requested id.
        id: NotificationId,
    },

    /// The persistence backend failed.
    #[error("{0}")]
    Storage(#[from] StoreError),
}

impl NotificationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Returns true if the caller should see a "not found" response.
    ///
    /// `Forbidden` is folded into this so record existence never leaks to
    /// users who do not own the record.
    #[must_use]
    pub const fn is_not_visible(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Forbidden { .. })
    }
}

/// Result alias for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;
