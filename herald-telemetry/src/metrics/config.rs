//! Metrics configuration types.

use serde::{Deserialize, Serialize};

/// Configuration for the metrics system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Serve a standalone Prometheus scrape listener in addition to
    /// `/api/v1/metrics`
    #[serde(default)]
    pub expose_endpoint: bool,

    /// Address for the scrape listener (e.g., "0.0.0.0:9090")
    #[serde(default = "default_endpoint_address")]
    pub endpoint_address: String,

    /// Histogram buckets for latency metrics (in seconds)
    #[serde(default = "default_latency_buckets")]
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expose_endpoint: false,
            endpoint_address: default_endpoint_address(),
            latency_buckets: default_latency_buckets(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_endpoint_address() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_latency_buckets() -> Vec<f64> {
    vec![
        0.0001, // 100µs
        0.0005, // 500µs
        0.001,  // 1ms
        0.005,  // 5ms
        0.01,   // 10ms
        0.05,   // 50ms
        0.1,    // 100ms
        0.5,    // 500ms
        1.0,    // 1s
        5.0,    // 5s
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert!(!config.expose_endpoint);
        assert_eq!(config.endpoint_address, "0.0.0.0:9090");
        assert!(!config.latency_buckets.is_empty());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: MetricsConfig =
            serde_json::from_str(r#"{"expose_endpoint": true}"#).unwrap();
        assert!(parsed.enabled);
        assert!(parsed.expose_endpoint);
        assert_eq!(parsed.latency_buckets, MetricsConfig::default().latency_buckets);
    }
}
