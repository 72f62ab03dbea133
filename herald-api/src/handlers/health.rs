//! Health check and system status handlers.

use axum::{
    Json,
    extract::State,
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;

use herald_telemetry::metrics::{HeraldMetrics, render_metrics};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Open push sessions
    pub active_sessions: usize,
}

/// Health check handler.
///
/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_secs(),
        active_sessions: state.registry().len(),
    })
}

/// Prometheus metrics handler.
///
/// GET /metrics
///
/// Refreshes the store and session gauges, then renders the exposition text.
pub async fn metrics(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let stored_notifications = state
        .service
        .store()
        .count()
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    HeraldMetrics::stored_notifications(stored_notifications);
    HeraldMetrics::active_sessions(state.registry().len());

    Ok((
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        render_metrics(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{router, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use herald_core::record::InboundEvent;
    use herald_telemetry::metrics::{MetricsConfig, init_metrics};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let state = test_state();
        let response = health_check(State(state)).await;

        assert_eq!(response.status, "healthy");
        assert_eq!(response.active_sessions, 0);
    }

    #[tokio::test]
    async fn test_metrics_renders_prometheus_text() {
        let _ = init_metrics(&MetricsConfig::default());
        let state = test_state();
        state
            .service
            .ingest(InboundEvent::new("u1", "NEW_TASK", "hello"))
            .await
            .unwrap();

        let request = Request::builder()
            .uri("/api/v1/metrics")
            .body(Body::empty())
            .unwrap();
        let response = router(&state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROMETHEUS_CONTENT_TYPE
        );
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("herald_notifications_stored 1"));
        assert!(text.contains("herald_notifications_ingested_total"));
    }
}
