//! WebSocket push channel.
//!
//! `GET /ws/notifications/{user_id}` opens a push session for `user_id`.
//! The caller authenticates with a JWT passed either as `?token=<jwt>` or in
//! the `Authorization: Bearer` header. The principal and the requested user
//! id go through the [`AuthorizationGate`](herald_core::gate::AuthorizationGate)
//! before the upgrade; a refused request never becomes a WebSocket.
//!
//! Once open, the server writes one text frame per notification (the JSON
//! form of the record) and pings every `heartbeat_interval_secs`. Inbound text
//! is logged and otherwise ignored. Opening a second session for the same
//! user closes the first.

mod config;
mod handler;

pub use config::WsConfig;
pub use handler::{ChannelQuery, channel_handler};
