//! # Herald API
//!
//! REST and WebSocket surface for Herald notifications.
//!
//! # Routes
//!
//! - `GET  /api/v1/health` - liveness and session count
//! - `GET  /api/v1/metrics` - Prometheus exposition
//! - `POST /api/v1/notifications/events` - ingest an event (service or admin)
//! - `GET  /api/v1/notifications/history` - the caller's notifications
//! - `GET  /api/v1/notifications/unread-count` - the caller's unread count
//! - `PUT  /api/v1/notifications/{id}/read` - acknowledge a notification
//! - `GET  /api/v1/admin/notifications` - every notification (admin)
//! - `POST /api/v1/admin/notifications/broadcast` - announcement (admin)
//! - `GET  /ws/notifications/{user_id}` - push channel
//!
//! # Authentication
//!
//! Everything except health and metrics requires a JWT passed as
//! `Authorization: Bearer <token>`. The push channel also accepts
//! `?token=<jwt>`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::ApiError;
pub use server::ApiServer;
pub use state::AppState;
pub use ws::WsConfig;
