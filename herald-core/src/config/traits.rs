//! Configuration traits for validation and environment overrides.

use crate::error::ConfigError;

/// Trait for types that can be validated.
///
/// ```rust
/// use herald_core::config::Validatable;
/// use herald_core::error::ConfigError;
///
/// struct ListenConfig {
///     port: u16,
///     host: String,
/// }
///
/// impl Validatable for ListenConfig {
///     fn validate(&self) -> Result<(), ConfigError> {
///         if self.port == 0 {
///             return Err(ConfigError::invalid_value("port", "Port cannot be 0"));
///         }
///         if self.host.is_empty() {
///             return Err(ConfigError::missing_field("host"));
///         }
///         Ok(())
///     }
/// }
///
/// let config = ListenConfig { port: 0, host: "0.0.0.0".into() };
/// assert!(config.validate().is_err());
/// ```
pub trait Validatable {
    /// Validates the configuration.
    ///
    /// Returns `Ok(())` if the configuration is valid, or a `ConfigError`
    /// describing what is invalid.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Trait for types that support environment variable overrides.
pub trait Configurable: Sized {
    /// Applies environment variable overrides read through `lookup`.
    ///
    /// `lookup` receives the full variable name (prefix included) and returns
    /// its value if set. Taking the lookup as a parameter keeps overrides
    /// testable without touching the process environment.
    fn apply_env_overrides(
        &mut self,
        prefix: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError>;

    /// Returns the environment variable names that can override this
    /// configuration.
    fn env_var_names(prefix: &str) -> Vec<String>;
}
