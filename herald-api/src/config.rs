//! API configuration types.
//!
//! This module provides configuration for the API server including:
//! - Server binding address and port
//! - JWT authentication settings
//! - CORS settings
//! - WebSocket push channel settings

use serde::{Deserialize, Serialize};

use herald_core::config::Validatable;
use herald_core::error::ConfigError;
use herald_core::gate::DEFAULT_MONITOR_CHANNEL;

use crate::ws::WsConfig;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// JWT configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// WebSocket configuration
    #[serde(default)]
    pub websocket: WsConfig,

    /// Reserved channel name administrators bind to watch every delivery
    #[serde(default = "default_monitor_channel")]
    pub monitor_channel: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            jwt: JwtConfig::default(),
            cors: CorsConfig::default(),
            websocket: WsConfig::default(),
            monitor_channel: default_monitor_channel(),
        }
    }
}

impl ApiConfig {
    /// Returns the server bind address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Validatable for ApiConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::missing_field("api.host"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid_value("api.port", "Port cannot be 0"));
        }
        if self.monitor_channel.trim().is_empty() {
            return Err(ConfigError::missing_field("api.monitor_channel"));
        }
        self.jwt.validate()?;
        self.cors.validate()?;
        self.websocket.validate()
    }
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens (override with `HERALD_JWT_SECRET`)
    #[serde(default = "default_jwt_secret")]
    pub secret: String,

    /// Token expiration time in seconds
    #[serde(default = "default_token_expiration")]
    pub expiration_secs: u64,

    /// Issuer claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Audience claim
    #[serde(default = "default_audience")]
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            expiration_secs: default_token_expiration(),
            issuer: default_issuer(),
            audience: default_audience(),
        }
    }
}

impl Validatable for JwtConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::missing_field("api.jwt.secret"));
        }
        if self.expiration_secs == 0 {
            return Err(ConfigError::invalid_value(
                "api.jwt.expiration_secs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Enable CORS
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Allowed origins (empty means all origins)
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Allow credentials; requires explicit origins
    #[serde(default)]
    pub allow_credentials: bool,

    /// Max age for preflight cache in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec![],
            allow_credentials: false,
            max_age_secs: default_max_age(),
        }
    }
}

impl Validatable for CorsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.allow_credentials && self.allowed_origins.is_empty() {
            return Err(ConfigError::invalid_value(
                "api.cors.allow_credentials",
                "credentials require explicit allowed_origins",
            ));
        }
        Ok(())
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_token_expiration() -> u64 {
    3600
}

fn default_issuer() -> String {
    "herald".to_string()
}

fn default_audience() -> String {
    "herald-api".to_string()
}

fn default_monitor_channel() -> String {
    DEFAULT_MONITOR_CHANNEL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_age() -> u64 {
    3600
}
