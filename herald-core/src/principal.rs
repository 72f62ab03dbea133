//! Authenticated principals and roles.

use serde::{Deserialize, Serialize};

/// Role carried by a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator: may read the global stream and bind the monitor channel.
    Admin,
    /// Regular end user.
    User,
    /// Upstream system allowed to submit events.
    Service,
}

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier.
    pub id: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Principal {
    /// Creates a principal with the given roles.
    #[must_use]
    pub fn new(id: impl Into<String>, roles: impl Into<Vec<Role>>) -> Self {
        Self {
            id: id.into(),
            roles: roles.into(),
        }
    }

    /// Returns true if the principal carries `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns true if the principal is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Returns true if the principal may submit inbound events.
    #[must_use]
    pub fn can_ingest(&self) -> bool {
        self.has_role(Role::Service) || self.is_admin()
    }
}
