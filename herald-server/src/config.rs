//! Server configuration.
//!
//! One file configures every component. Sections are optional; anything
//! left out falls back to its default.
//!
//! ```yaml
//! api:
//!   port: 8080
//!   jwt:
//!     secret: change-me
//! storage:
//!   backend: file
//!   path: /var/lib/herald/notifications.json
//! logging:
//!   level: info
//!   format: json
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use herald_api::ApiConfig;
use herald_core::config::{Configurable, Validatable};
use herald_core::dispatcher::DeliveryConfig;
use herald_core::error::ConfigError;
use herald_core::events::EventBusConfig;
use herald_core::store::{StorageBackend, StorageConfig};
use herald_telemetry::logging::LogConfig;
use herald_telemetry::metrics::MetricsConfig;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP and push channel settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Notification store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Push delivery settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// In-process event queue settings.
    #[serde(default)]
    pub events: EventBusConfig,

    /// Shutdown settings.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl ServerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies command-line overrides and validates the result.
    pub fn with_overrides(mut self, overrides: &CliOverrides) -> Result<Self, ConfigError> {
        if let Some(host) = &overrides.host {
            self.api.host.clone_from(host);
        }
        if let Some(port) = overrides.port {
            self.api.port = port;
        }
        if overrides.debug {
            self.logging.level = "debug".to_string();
        }
        self.validate()?;
        Ok(self)
    }
}

/// Settings given on the command line. They take precedence over the file
/// and the environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
    /// Force debug logging.
    pub debug: bool,
}

impl Configurable for ServerConfig {
    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |suffix: &str| lookup(&format!("{prefix}_{suffix}"));

        if let Some(host) = var("HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("PORT") {
            self.api.port = parse_var(prefix, "PORT", &port)?;
        }
        if let Some(secret) = var("JWT_SECRET") {
            self.api.jwt.secret = secret;
        }
        if let Some(channel) = var("MONITOR_CHANNEL") {
            self.api.monitor_channel = channel;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(path) = var("STORAGE_PATH") {
            self.storage.backend = StorageBackend::File;
            self.storage.path = Some(path.into());
        }
        if let Some(secs) = var("SHUTDOWN_TIMEOUT") {
            self.shutdown.timeout_secs = parse_var(prefix, "SHUTDOWN_TIMEOUT", &secs)?;
        }
        if let Some(enabled) = var("METRICS_ENABLED") {
            self.metrics.enabled = parse_var(prefix, "METRICS_ENABLED", &enabled)?;
        }
        Ok(())
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        [
            "HOST",
            "PORT",
            "JWT_SECRET",
            "MONITOR_CHANNEL",
            "LOG_LEVEL",
            "STORAGE_PATH",
            "SHUTDOWN_TIMEOUT",
            "METRICS_ENABLED",
        ]
        .iter()
        .map(|suffix| format!("{prefix}_{suffix}"))
        .collect()
    }
}

fn parse_var<T: std::str::FromStr>(prefix: &str, suffix: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar {
        name: format!("{prefix}_{suffix}"),
        reason: e.to_string(),
    })
}

impl Validatable for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::missing_field("logging.level"));
        }
        self.storage.validate()?;
        self.delivery.validate()?;
        self.events.validate()?;
        if self.metrics.expose_endpoint
            && self.metrics.endpoint_address.parse::<std::net::SocketAddr>().is_err()
        {
            return Err(ConfigError::invalid_value(
                "metrics.endpoint_address",
                format!("'{}' is not a socket address", self.metrics.endpoint_address),
            ));
        }
        self.shutdown.validate()
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Time allowed for in-flight work after the signal, in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ShutdownConfig {
    /// Returns the shutdown timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Validatable for ShutdownConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "shutdown.timeout_secs",
                "Timeout must be positive",
            ));
        }
        Ok(())
    }
}
