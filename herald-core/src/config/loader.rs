//! Configuration loader supporting YAML, TOML and JSON.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::traits::{Configurable, Validatable};
use crate::error::ConfigError;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml)
    #[default]
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "yaml" | "yml" => Some(Self::Yaml),
                "toml" => Some(Self::Toml),
                "json" => Some(Self::Json),
                _ => None,
            })
    }

    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Configuration loader with format detection and environment overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    env_prefix: Option<String>,
    allow_missing: bool,
}

impl ConfigLoader {
    /// Creates a loader that requires the file to exist and applies no
    /// environment overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the environment variable prefix for overrides, e.g. `HERALD`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Falls back to `T::default()` when the file does not exist.
    #[must_use]
    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }

    /// Returns the environment variable prefix, if set.
    #[must_use]
    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// Loads a file, applies environment overrides from the process
    /// environment and validates the result.
    pub fn load<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default + Configurable + Validatable,
        P: AsRef<Path>,
    {
        self.load_with_env(path, &|name| std::env::var(name).ok())
    }

    /// Like [`load`](Self::load) with an explicit environment lookup.
    pub fn load_with_env<T, P>(
        &self,
        path: P,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default + Configurable + Validatable,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let mut config: T = if self.allow_missing && !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            T::default()
        } else {
            self.load_file(path)?
        };

        if let Some(prefix) = &self.env_prefix {
            config.apply_env_overrides(prefix, lookup)?;
            debug!(prefix = %prefix, "Applied environment overrides");
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses a file. The format is detected from the file extension.
    pub fn load_file<T, P>(&self, path: P) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::InvalidFormat {
            path: path.display().to_string(),
            reason: "Unrecognized file extension. Supported: .yaml, .yml, .toml, .json".to_string(),
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        self.load_str(&content, format).map_err(|err| match err {
            ConfigError::InvalidFormat { reason, .. } => ConfigError::InvalidFormat {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parses configuration from a string with the specified format.
    pub fn load_str<T>(&self, content: &str, format: ConfigFormat) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let invalid = |reason: String| ConfigError::InvalidFormat {
            path: "<string>".to_string(),
            reason,
        };

        match format {
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| invalid(format!("YAML parse error: {e}")))
            }
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| invalid(format!("TOML parse error: {e}")))
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| invalid(format!("JSON parse error: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;
    use std::io::Write;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    #[serde(default)]
    struct TestConfig {
        host: String,
        port: u16,
        debug: bool,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                host: "127.0.0.1".to_string(),
                port: 9000,
                debug: false,
            }
        }
    }

    impl Configurable for TestConfig {
        fn apply_env_overrides(
            &mut self,
            prefix: &str,
            lookup: &dyn Fn(&str) -> Option<String>,
        ) -> Result<(), ConfigError> {
            if let Some(host) = lookup(&format!("{prefix}_HOST")) {
                self.host = host;
            }
            if let Some(port) = lookup(&format!("{prefix}_PORT")) {
                self.port = port.parse().map_err(|_| ConfigError::InvalidEnvVar {
                    name: format!("{prefix}_PORT"),
                    reason: "not a port number".to_string(),
                })?;
            }
            Ok(())
        }

        fn env_var_names(prefix: &str) -> Vec<String> {
            vec![format!("{prefix}_HOST"), format!("{prefix}_PORT")]
        }
    }

    impl Validatable for TestConfig {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.port == 0 {
                return Err(ConfigError::invalid_value("port", "Port cannot be 0"));
            }
            Ok(())
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yaml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("config.txt")), None);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), None);
    }

    #[test]
    fn test_load_each_format() {
        let loader = ConfigLoader::new();

        let yaml: TestConfig = loader
            .load_str("host: localhost\nport: 8080\n", ConfigFormat::Yaml)
            .unwrap();
        let toml: TestConfig = loader
            .load_str("host = \"localhost\"\nport = 8080\n", ConfigFormat::Toml)
            .unwrap();
        let json: TestConfig = loader
            .load_str(r#"{"host": "localhost", "port": 8080}"#, ConfigFormat::Json)
            .unwrap();

        assert_eq!(yaml, toml);
        assert_eq!(toml, json);
        assert_eq!(json.port, 8080);
        assert!(!json.debug);
    }

    #[test]
    fn test_invalid_yaml() {
        let loader = ConfigLoader::new();
        let err = loader
            .load_str::<TestConfig>("host: [invalid", ConfigFormat::Yaml)
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidFormat { .. }));
        assert!(err.to_string().contains("YAML parse error"));
    }

    #[test]
    fn test_missing_file_is_error_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new()
            .load_with_env::<TestConfig, _>(dir.path().join("absent.yaml"), &|_| None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config: TestConfig = ConfigLoader::new()
            .allow_missing(true)
            .load_with_env(dir.path().join("absent.yaml"), &|_| None)
            .unwrap();
        assert_eq!(config, TestConfig::default());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "host = \"file-host\"\nport = 7000").unwrap();

        let vars = env(&[("APP_PORT", "7100")]);
        let config: TestConfig = ConfigLoader::new()
            .with_env_prefix("APP")
            .load_with_env(&path, &|name| vars.get(name).cloned())
            .unwrap();

        assert_eq!(config.host, "file-host");
        assert_eq!(config.port, 7100);
        assert_eq!(
            TestConfig::env_var_names("APP"),
            vec!["APP_HOST".to_string(), "APP_PORT".to_string()]
        );
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let vars = env(&[("APP_PORT", "not-a-port")]);
        let err = ConfigLoader::new()
            .with_env_prefix("APP")
            .allow_missing(true)
            .load_with_env::<TestConfig, _>(dir.path().join("x.yaml"), &|name| {
                vars.get(name).cloned()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_validation_runs_after_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let vars = env(&[("APP_PORT", "0")]);
        let err = ConfigLoader::new()
            .with_env_prefix("APP")
            .allow_missing(true)
            .load_with_env::<TestConfig, _>(dir.path().join("x.yaml"), &|name| {
                vars.get(name).cloned()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
