//! API error types.
//!
//! [`ApiError`] is what every handler returns on failure. Domain errors from
//! the notification service convert into it; "not yours" and "does not exist"
//! produce the same response so record ids cannot be probed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use herald_core::error::NotificationError;

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access forbidden
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request / validation error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Service unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the error code string.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Validation { reason } => Self::BadRequest(reason),
            NotificationError::NotFound { id } | NotificationError::Forbidden { id } => {
                Self::NotFound(format!("Notification not found: {id}"))
            }
            NotificationError::Storage(e) => {
                error!(error = %e, "Storage failure");
                Self::ServiceUnavailable("notification storage unavailable".to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error status
    pub status: &'static str,
    /// Error code
    pub code: &'static str,
    /// Error message
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            status: "error",
            code: self.error_code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::error::StoreError;
    use herald_core::record::NotificationId;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::Unauthorized("test".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("test".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_forbidden_and_not_found_are_indistinguishable() {
        let id = NotificationId::from("n-42");
        let missing = ApiError::from(NotificationError::NotFound { id: id.clone() });
        let foreign = ApiError::from(NotificationError::Forbidden { id });

        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(foreign.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), foreign.to_string());
    }

    #[test]
    fn test_domain_error_mapping() {
        let validation = ApiError::from(NotificationError::validation("kind is required"));
        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);

        let storage = ApiError::from(NotificationError::Storage(StoreError::Unavailable {
            reason: "disk".to_string(),
        }));
        assert_eq!(storage.error_code(), "SERVICE_UNAVAILABLE");
        assert!(!storage.to_string().contains("disk"));
    }
}
