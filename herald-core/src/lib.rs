//! # Herald Core
//!
//! Notification ingestion, persistence, session tracking and delivery.
//!
//! This crate provides:
//! - Notification record types and read-state filters
//! - The [`NotificationStore`](store::NotificationStore) contract with memory
//!   and JSON-file backends
//! - A concurrent [`SessionRegistry`](session::SessionRegistry) of live push
//!   channels
//! - The channel-open [`AuthorizationGate`](gate::AuthorizationGate)
//! - Single-attempt delivery through [`DeliveryDispatcher`](dispatcher::DeliveryDispatcher)
//! - [`NotificationService`](service::NotificationService), which orchestrates
//!   the above
//! - An in-process event bus and configuration loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]

/// Configuration loading
pub mod config;

/// Delivery of records to live sessions
pub mod dispatcher;

/// Error types and handling
pub mod error;

/// In-process event bus
pub mod events;

/// Channel-open authorization
pub mod gate;

/// Authenticated principals
pub mod principal;

/// Notification records
pub mod record;

/// Notification orchestration
pub mod service;

/// Live push sessions
pub mod session;

/// Notification persistence
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dispatcher::{BroadcastReport, DeliveryConfig, DeliveryDispatcher, DeliveryOutcome};
    pub use crate::error::{NotificationError, NotificationResult};
    pub use crate::gate::AuthorizationGate;
    pub use crate::principal::{Principal, Role};
    pub use crate::record::{InboundEvent, NotificationId, NotificationRecord, ReadFilter};
    pub use crate::service::NotificationService;
    pub use crate::session::{PushChannel, SessionRegistry};
    pub use crate::store::NotificationStore;
}
