//! API server implementation.

use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::middleware::RequestIdLayer;
use crate::routes::create_router;
use crate::state::AppState;

/// API server.
#[derive(Debug)]
pub struct ApiServer {
    /// Server configuration
    config: ApiConfig,
    /// Application state
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a server around composed application state.
    #[must_use]
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            config: state.config.clone(),
            state,
        }
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The full router with request-id and tracing layers applied.
    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state))
            .layer(RequestIdLayer::new())
            .layer(TraceLayer::new_for_http())
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ApiError> {
        let addr = self.config.bind_address();

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| ApiError::Internal(format!("Invalid bind address: {e}")))?;

        TcpListener::bind(socket_addr)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to bind to {addr}: {e}")))
    }

    /// Serves on an already bound listener until `shutdown_signal` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ApiError> {
        let app = self.router();

        match listener.local_addr() {
            Ok(addr) => info!(%addr, "API server listening"),
            Err(e) => warn!(error = %e, "API server listening on unknown address"),
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {e}")))?;

        warn!("API server shutting down");
        Ok(())
    }

    /// Binds and runs the API server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ApiError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{test_state, token};
    use futures::{SinkExt, StreamExt};
    use herald_core::principal::Role;
    use herald_core::record::{InboundEvent, NotificationRecord};
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn spawn_server(state: Arc<AppState>) -> (SocketAddr, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let server = ApiServer::new(state);
        tokio::spawn(server.serve(listener, async {
            let _ = rx.await;
        }));
        (addr, tx)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    /// Next text frame, skipping control frames. `None` once the session ends.
    async fn next_text(client: &mut Client) -> Option<String> {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .unwrap();
            match message {
                Some(Ok(Message::Text(text))) => return Some(text.to_string()),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(_) | Err(_)) | None => return None,
            }
        }
    }

    #[test]
    fn test_api_server_new() {
        let state = test_state();
        let server = ApiServer::new(Arc::clone(&state));
        assert!(Arc::ptr_eq(server.state(), &state));
        assert_eq!(server.config.bind_address(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_push_session_end_to_end() {
        let state = test_state();
        let (addr, shutdown) = spawn_server(Arc::clone(&state)).await;
        let jwt = token(&state, "u1", &[Role::User]);
        let url = format!("ws://{addr}/ws/notifications/u1?token={jwt}");

        let (mut first, _) = connect_async(url.as_str()).await.unwrap();
        wait_until(|| state.registry().contains("u1")).await;

        let record = state
            .service
            .ingest(InboundEvent::new("u1", "NEW_TASK", "Task X assigned"))
            .await
            .unwrap();
        let frame = next_text(&mut first).await.unwrap();
        let pushed: NotificationRecord = serde_json::from_str(&frame).unwrap();
        assert_eq!(pushed, record);

        // A second session replaces the first, which is closed.
        let before = state.registry().lookup("u1").unwrap().id();
        let (mut second, _) = connect_async(url.as_str()).await.unwrap();
        wait_until(|| {
            state
                .registry()
                .lookup("u1")
                .is_some_and(|c| c.id() != before)
        })
        .await;
        assert_eq!(next_text(&mut first).await, None);
        assert_eq!(state.registry().len(), 1);

        state
            .service
            .ingest(InboundEvent::new("u1", "NEW_TASK", "Task Y assigned"))
            .await
            .unwrap();
        let frame = next_text(&mut second).await.unwrap();
        assert!(frame.contains("Task Y assigned"));

        second.close(None).await.unwrap();
        wait_until(|| state.registry().is_empty()).await;

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_push_session_rejects_bad_token() {
        let state = test_state();
        let (addr, shutdown) = spawn_server(Arc::clone(&state)).await;

        let result = connect_async(format!("ws://{addr}/ws/notifications/u1?token=bogus")).await;
        match result {
            Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                assert_eq!(response.status(), 401);
            }
            other => panic!("expected HTTP 401, got {other:?}"),
        }
        assert!(state.registry().is_empty());

        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn test_admin_monitor_sees_user_deliveries() {
        let state = test_state();
        let (addr, shutdown) = spawn_server(Arc::clone(&state)).await;
        let admin = token(&state, "admin", &[Role::Admin]);

        let (mut monitor, _) = connect_async(format!(
            "ws://{addr}/ws/notifications/admin_monitor?token={admin}"
        ))
        .await
        .unwrap();
        wait_until(|| state.registry().contains("admin_monitor")).await;

        state
            .service
            .ingest(InboundEvent::new("u7", "NEW_TASK", "Task Z assigned"))
            .await
            .unwrap();
        let frame = next_text(&mut monitor).await.unwrap();
        let mirrored: NotificationRecord = serde_json::from_str(&frame).unwrap();
        assert_eq!(mirrored.recipient_id, "u7");

        let _ = shutdown.send(());
    }
}
