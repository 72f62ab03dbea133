//! API middleware components.
//!
//! - JWT authentication and the administrator guard
//! - Request ID propagation

pub mod auth;
mod request_id;

pub use auth::{Auth, AuthenticatedUser};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer};
