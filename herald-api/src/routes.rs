//! API route definitions.

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::CorsConfig;
use crate::handlers::{admin, health, notifications};
use crate::middleware::auth::{auth_middleware, require_admin};
use crate::state::AppState;
use crate::ws::channel_handler;

/// Creates the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.cors);

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/notifications/events", post(notifications::ingest_event))
        .route("/notifications/history", get(notifications::history))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Admin routes (authentication required, admin only)
    let admin_routes = Router::new()
        .route("/notifications", get(admin::list_all))
        .route("/notifications/broadcast", post(admin::broadcast))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Push channel (token via query param or header, checked by the handler)
    let ws_routes = Router::new().route("/ws/notifications/{user_id}", get(channel_handler));

    Router::new()
        .nest("/api/v1", public_routes.merge(protected_routes))
        .nest("/api/v1/admin", admin_routes)
        .merge(ws_routes)
        .layer(cors)
        .with_state(state)
}

/// Builds the CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let mut cors = CorsLayer::new().max_age(Duration::from_secs(config.max_age_secs));

    if config.allowed_origins.is_empty() {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(%origin, "Ignoring unparsable CORS origin");
                    None
                }
            })
            .collect();
        cors = cors.allow_origin(AllowOrigin::list(origins));
    }

    // Wildcards are not allowed together with credentials
    if config.allow_credentials && !config.allowed_origins.is_empty() {
        cors.allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        cors.allow_methods(Any).allow_headers(Any)
    }
}
