//! Notification record types.
//!
//! - [`NotificationRecord`] - the durable unit of truth for one event
//! - [`InboundEvent`] - the transient payload a record is built from
//! - [`ReadFilter`] - tri-state read-state filter used by history queries

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NotificationError;

/// Recipient id of records created by an administrator announcement.
pub const BROADCAST_RECIPIENT: &str = "*";

/// Opaque, store-issued notification identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A notification addressed to one user.
///
/// Every field except `read` is fixed at construction. `read` only ever
/// moves from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Store-issued id; `None` until the record is first saved.
    pub id: Option<NotificationId>,
    /// Target user.
    pub recipient_id: String,
    /// Event classification, e.g. `NEW_TASK`.
    pub kind: String,
    /// Human-readable payload.
    pub message: String,
    /// Creation time on the ingesting side.
    pub created_at: DateTime<Utc>,
    /// Whether the recipient has acknowledged the notification.
    #[serde(default)]
    pub read: bool,
}

impl NotificationRecord {
    /// Creates an unsaved, unread record stamped with the current time.
    #[must_use]
    pub fn new(
        recipient_id: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            recipient_id: recipient_id.into(),
            kind: kind.into(),
            message: message.into(),
            created_at: Utc::now(),
            read: false,
        }
    }

    /// Returns true if `user_id` is the recipient of this record.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.recipient_id == user_id
    }

    /// Returns a copy with `read` set. The receiver is left untouched so a
    /// failed save cannot leave a half-applied mutation behind.
    #[must_use]
    pub fn marked_read(&self) -> Self {
        Self {
            read: true,
            ..self.clone()
        }
    }
}

impl From<InboundEvent> for NotificationRecord {
    fn from(event: InboundEvent) -> Self {
        Self::new(event.recipient_id, event.kind, event.message)
    }
}

/// An event pushed into the system by an upstream producer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Target user.
    pub recipient_id: String,
    /// Event classification.
    pub kind: String,
    /// Human-readable payload.
    pub message: String,
    /// Producing system, e.g. `PROJECTS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl InboundEvent {
    /// Creates an event without an origin tag.
    #[must_use]
    pub fn new(
        recipient_id: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            kind: kind.into(),
            message: message.into(),
            origin: None,
        }
    }

    /// Sets the origin tag.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Checks that every required field is present and that the recipient is
    /// not the reserved announcement id.
    pub fn validate(&self) -> Result<(), NotificationError> {
        let recipient_id = self.recipient_id.trim();
        if recipient_id.is_empty() {
            return Err(NotificationError::validation("recipient_id is required"));
        }
        if recipient_id == BROADCAST_RECIPIENT {
            return Err(NotificationError::validation(format!(
                "recipient_id \"{BROADCAST_RECIPIENT}\" is reserved for announcements"
            )));
        }
        self.validate_content()
    }

    /// Checks `kind` and `message` only.
    pub(crate) fn validate_content(&self) -> Result<(), NotificationError> {
        if self.kind.trim().is_empty() {
            return Err(NotificationError::validation("kind is required"));
        }
        if self.message.trim().is_empty() {
            return Err(NotificationError::validation("message is required"));
        }
        Ok(())
    }
}

/// Read-state filter for history queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadFilter {
    /// No filtering.
    #[default]
    All,
    /// Only records with `read == true`.
    Read,
    /// Only records with `read == false`.
    Unread,
}

impl ReadFilter {
    /// Returns true if the record passes the filter.
    #[must_use]
    pub const fn matches(self, record: &NotificationRecord) -> bool {
        match self {
            Self::All => true,
            Self::Read => record.read,
            Self::Unread => !record.read,
        }
    }
}

impl From<Option<bool>> for ReadFilter {
    fn from(read: Option<bool>) -> Self {
        match read {
            None => Self::All,
            Some(true) => Self::Read,
            Some(false) => Self::Unread,
        }
    }
}
