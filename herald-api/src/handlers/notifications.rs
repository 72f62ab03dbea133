//! Notification ingestion, history and read-state handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use herald_core::record::{InboundEvent, NotificationId, NotificationRecord, ReadFilter};

use crate::error::{ApiError, ApiResult};
use crate::middleware::Auth;
use crate::response::{ApiResponse, CreatedResponse, PaginatedResponse};
use crate::state::AppState;

/// History query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Read-state filter; absent means all
    #[serde(default)]
    pub read: Option<bool>,
    /// Page number (1-indexed)
    #[serde(default)]
    pub page: Option<u32>,
    /// Items per page
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl HistoryQuery {
    /// The read-state filter requested.
    #[must_use]
    pub fn filter(&self) -> ReadFilter {
        ReadFilter::from(self.read)
    }
}

/// Unread counter.
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    /// Unread notifications addressed to the caller
    pub unread: usize,
}

/// Ingest an inbound event.
///
/// POST /api/v1/notifications/events
pub async fn ingest_event(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
    Json(event): Json<InboundEvent>,
) -> ApiResult<CreatedResponse<NotificationRecord>> {
    if !user.principal.can_ingest() {
        warn!(caller_id = %user.user_id(), "Event submission refused");
        return Err(ApiError::Forbidden(
            "Service or administrator role required".to_string(),
        ));
    }

    let record = state.service.ingest(event).await?;
    Ok(CreatedResponse::new(record))
}

/// The caller's own notifications.
///
/// GET /api/v1/notifications/history
pub async fn history(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<PaginatedResponse<NotificationRecord>> {
    let records = state.service.history(user.user_id(), query.filter()).await?;
    Ok(PaginatedResponse::paginate(records, query.page, query.per_page))
}

/// Number of unread notifications for the caller.
///
/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
) -> ApiResult<ApiResponse<UnreadCount>> {
    let unread = state.service.unread_count(user.user_id()).await?;
    Ok(ApiResponse::success(UnreadCount { unread }))
}

/// Mark one of the caller's notifications as read.
///
/// PUT /api/v1/notifications/{id}/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<NotificationRecord>> {
    let record = state
        .service
        .mark_read(&NotificationId::from(id), user.user_id())
        .await?;
    Ok(ApiResponse::success(record))
}
