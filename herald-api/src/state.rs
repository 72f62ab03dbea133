//! Application state for the API server.

use std::sync::Arc;
use std::time::Instant;

use herald_core::gate::AuthorizationGate;
use herald_core::service::NotificationService;
use herald_core::session::SessionRegistry;

use crate::auth::JwtManager;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// API configuration
    pub config: ApiConfig,
    /// JWT manager for authentication
    pub jwt_manager: Arc<JwtManager>,
    /// Notification operations
    pub service: Arc<NotificationService>,
    /// Channel-open policy
    pub gate: AuthorizationGate,
    started_at: Instant,
}

impl AppState {
    /// Creates the state around an already composed service.
    #[must_use]
    pub fn new(config: ApiConfig, service: Arc<NotificationService>) -> Self {
        let jwt_manager = Arc::new(JwtManager::new(&config.jwt));
        let gate = AuthorizationGate::new(config.monitor_channel.clone());

        Self {
            config,
            jwt_manager,
            service,
            gate,
            started_at: Instant::now(),
        }
    }

    /// Live push sessions.
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        self.service.registry()
    }

    /// Seconds since the state was created.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by handler and route tests.

    use super::*;
    use axum::{Router, body::Body, http::Request, response::Response};
    use herald_core::dispatcher::{DeliveryConfig, DeliveryDispatcher};
    use herald_core::principal::Role;
    use herald_core::store::InMemoryNotificationStore;
    use tower::ServiceExt;

    use crate::routes::create_router;

    pub(crate) fn test_state() -> Arc<AppState> {
        let config = ApiConfig::default();
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = Arc::new(DeliveryDispatcher::new(
            registry,
            DeliveryConfig::default(),
            config.monitor_channel.clone(),
        ));
        let service = Arc::new(NotificationService::new(
            Arc::new(InMemoryNotificationStore::new()),
            dispatcher,
        ));
        Arc::new(AppState::new(config, service))
    }

    pub(crate) fn token(state: &AppState, user_id: &str, roles: &[Role]) -> String {
        state.jwt_manager.generate_token(user_id, roles).unwrap()
    }

    pub(crate) async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (Response, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, 1 << 20).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (Response::from_parts(parts, Body::empty()), json)
    }

    pub(crate) fn router(state: &Arc<AppState>) -> Router {
        create_router(Arc::clone(state))
    }
}

#[cfg(test)]
mod tests {
    use super::testing::test_state;

    #[test]
    fn test_app_state_new() {
        let state = test_state();
        assert_eq!(state.gate.monitor_channel(), "admin_monitor");
        assert!(state.registry().is_empty());
    }
}
