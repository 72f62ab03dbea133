//! WebSocket push channel configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use herald_core::config::Validatable;
use herald_core::error::ConfigError;

/// WebSocket server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsConfig {
    /// Interval between server pings, in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Maximum number of frames queued per session
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            max_queue_size: default_max_queue_size(),
        }
    }
}

impl WsConfig {
    /// Returns the heartbeat interval as a Duration.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Validatable for WsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                "api.websocket.heartbeat_interval_secs",
                "must be greater than 0",
            ));
        }
        if self.max_queue_size == 0 {
            return Err(ConfigError::invalid_value(
                "api.websocket.max_queue_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_max_queue_size() -> usize {
    256
}
