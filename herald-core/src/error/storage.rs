//! Storage-related error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`NotificationStore`](crate::store::NotificationStore)
/// backend.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed.
    #[error("[Storage] I/O error during {operation} on '{}': {source}", path.display())]
    Io {
        /// Operation that failed (read, create, write, sync, rename).
        operation: &'static str,
        /// File the operation targeted.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Records could not be encoded or decoded.
    #[error("[Storage] Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persisted data is inconsistent.
    #[error("[Storage] Data corrupted: {reason}")]
    Corrupted {
        /// What is inconsistent.
        reason: String,
    },

    /// The backend is not reachable.
    #[error("[Storage] Backend unavailable: {reason}")]
    Unavailable {
        /// Why the backend is unavailable.
        reason: String,
    },
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = StoreError::io(
            "write",
            "/var/lib/herald/notifications.json",
            std::io::Error::other("disk full"),
        );
        let msg = err.to_string();
        assert!(msg.contains("write"));
        assert!(msg.contains("notifications.json"));
        assert!(msg.contains("disk full"));
    }
}
