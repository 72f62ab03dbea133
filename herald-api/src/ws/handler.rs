//! Channel-open handler and session task.

use axum::{
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use herald_core::principal::Principal;
use herald_core::session::{ChannelReceiver, PushChannel, QueuedChannel, SessionLease};

use crate::auth::extract_bearer_token;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters for the channel-open request.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelQuery {
    /// JWT, as an alternative to the Authorization header
    #[serde(default)]
    pub token: Option<String>,
}

/// Opens a push session for `user_id`.
///
/// GET /ws/notifications/{user_id}
pub async fn channel_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<ChannelQuery>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> ApiResult<Response> {
    let principal = authenticate(&state, query.token.as_deref(), &headers)?;

    if !state.gate.can_bind(Some(&principal), &user_id) {
        warn!(caller_id = %principal.id, recipient_id = %user_id, "Channel bind refused");
        return Err(ApiError::Forbidden(format!(
            "Not allowed to open channel for '{user_id}'"
        )));
    }

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let config = state.config.websocket.clone();
    let (channel, frames) = QueuedChannel::new(config.max_queue_size);
    let channel_id = channel.id();

    Ok(upgrade
        .on_upgrade(move |socket| async move {
            let registry = Arc::clone(state.service.registry());
            let (lease, superseded) = registry.lease(user_id.clone(), Arc::new(channel));
            if let Some(old) = superseded {
                info!(recipient_id = %user_id, %channel_id, replaced = %old.id(), "Closing superseded session");
                old.close();
            }
            info!(recipient_id = %user_id, %channel_id, caller_id = %principal.id, "Push session opened");

            run_session(socket, frames, lease, config.heartbeat_interval()).await;
        })
        .into_response())
}

/// Resolves the caller from the query token or the Authorization header.
fn authenticate(state: &AppState, token: Option<&str>, headers: &HeaderMap) -> ApiResult<Principal> {
    let header_token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);

    let token = token
        .filter(|t| !t.is_empty())
        .or(header_token)
        .ok_or_else(|| ApiError::Unauthorized("Missing token".to_string()))?;

    state.jwt_manager.authenticate(token)
}

/// Pumps queued frames to the socket until either side closes.
///
/// The lease is released when this returns, which removes the registration
/// unless a newer session has already replaced it.
async fn run_session(
    socket: WebSocket,
    mut frames: ChannelReceiver,
    lease: SessionLease,
    heartbeat: std::time::Duration,
) {
    let channel_id = lease.channel_id();
    let user_id = lease.user_id().to_string();
    let (mut sink, mut stream) = socket.split();

    let mut heartbeat = interval_at(Instant::now() + heartbeat, heartbeat);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else {
                    debug!(%channel_id, "Channel closed, ending session");
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    warn!(%channel_id, error = %e, "Failed to write frame");
                    break;
                }
            }

            _ = heartbeat.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    debug!(%channel_id, "Ping failed, ending session");
                    break;
                }
            }

            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    debug!(%channel_id, len = text.as_str().len(), "Ignoring inbound text");
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!(%channel_id, "Client closed session");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(%channel_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }

    let released = lease.release();
    info!(recipient_id = %user_id, %channel_id, released, "Push session closed");
}
