//! Channel-open authorization.

use crate::principal::Principal;

/// Default name of the reserved administrator monitoring channel.
pub const DEFAULT_MONITOR_CHANNEL: &str = "admin_monitor";

/// Decides whether a principal may bind a push channel for a user id.
///
/// A principal may bind its own id. An administrator may additionally bind
/// the reserved monitoring channel. Nothing else is allowed, including
/// unauthenticated callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGate {
    monitor_channel: String,
}

impl AuthorizationGate {
    /// Creates a gate with a custom monitoring channel name.
    #[must_use]
    pub fn new(monitor_channel: impl Into<String>) -> Self {
        Self {
            monitor_channel: monitor_channel.into(),
        }
    }

    /// The reserved monitoring channel name.
    #[must_use]
    pub fn monitor_channel(&self) -> &str {
        &self.monitor_channel
    }

    /// Returns true if `principal` may bind `requested_user_id`.
    #[must_use]
    pub fn can_bind(&self, principal: Option<&Principal>, requested_user_id: &str) -> bool {
        let Some(principal) = principal else {
            return false;
        };
        principal.id == requested_user_id
            || (principal.is_admin() && requested_user_id == self.monitor_channel)
    }
}

impl Default for AuthorizationGate {
    fn default() -> Self {
        Self::new(DEFAULT_MONITOR_CHANNEL)
    }
}
