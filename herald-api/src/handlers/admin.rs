//! Administrator handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use herald_core::record::NotificationRecord;

use super::notifications::HistoryQuery;
use crate::error::ApiResult;
use crate::middleware::Auth;
use crate::response::{CreatedResponse, PaginatedResponse};
use crate::state::AppState;

/// Announcement request.
#[derive(Debug, Deserialize)]
pub struct AnnouncementRequest {
    /// Event classification
    pub kind: String,
    /// Human-readable payload
    pub message: String,
}

/// Announcement result.
#[derive(Debug, Serialize)]
pub struct AnnouncementResponse {
    /// The persisted announcement
    pub notification: NotificationRecord,
    /// Sessions that received it
    pub delivered: usize,
    /// Sessions whose push failed
    pub failed: usize,
}

/// Every notification in the system.
///
/// GET /api/v1/admin/notifications
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    Auth(user): Auth,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<PaginatedResponse<NotificationRecord>> {
    let records = state
        .service
        .all_history(&user.principal, query.filter())
        .await?;
    Ok(PaginatedResponse::paginate(records, query.page, query.per_page))
}

/// Persist an announcement and push it to every open session.
///
/// POST /api/v1/admin/notifications/broadcast
pub async fn broadcast(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnnouncementRequest>,
) -> ApiResult<CreatedResponse<AnnouncementResponse>> {
    let (notification, report) = state
        .service
        .announce(request.kind, request.message)
        .await?;

    Ok(CreatedResponse::new(AnnouncementResponse {
        notification,
        delivered: report.delivered,
        failed: report.failed,
    }))
}
