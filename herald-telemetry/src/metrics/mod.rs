//! Metrics collection and export.
//!
//! Provides Prometheus-compatible metrics for monitoring:
//! - Ingestion, rejection and read counters
//! - Delivery outcomes and push latency
//! - Announcement tallies
//! - Active push sessions

mod config;
mod recorder;

pub use config::MetricsConfig;
pub use recorder::HeraldMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::warn;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
///
/// Installs the global Prometheus recorder. With `expose_endpoint` set, a
/// scrape listener is spawned on the current Tokio runtime.
///
/// ```no_run
/// use herald_telemetry::metrics::{init_metrics, MetricsConfig};
///
/// # async fn run() {
/// init_metrics(&MetricsConfig::default()).expect("Failed to initialize metrics");
/// # }
/// ```
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if METRICS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let mut builder = PrometheusBuilder::new();
    if !config.latency_buckets.is_empty() {
        builder = builder
            .set_buckets(&config.latency_buckets)
            .map_err(|e| MetricsError::InitializationFailed(format!("{e}")))?;
    }

    let handle = if config.expose_endpoint {
        let addr: SocketAddr = config
            .endpoint_address
            .parse()
            .map_err(|e| MetricsError::InvalidAddress(format!("{e}")))?;

        let (recorder, exporter) = builder
            .with_http_listener(addr)
            .build()
            .map_err(|e| MetricsError::InitializationFailed(format!("{e}")))?;
        let handle = recorder.handle();
        metrics::set_global_recorder(recorder).map_err(|_| MetricsError::AlreadyInitialized)?;

        tokio::spawn(async move {
            if let Err(e) = exporter.await {
                warn!(error = ?e, "Metrics listener stopped");
            }
        });
        handle
    } else {
        builder
            .install_recorder()
            .map_err(|e| MetricsError::InitializationFailed(format!("{e}")))?
    };

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    HeraldMetrics::register();

    Ok(())
}

/// Get the Prometheus metrics output as a string.
///
/// Empty until [`init_metrics`] has succeeded.
#[must_use]
pub fn render_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Metrics already initialized
    #[error("Metrics system already initialized")]
    AlreadyInitialized,

    /// Invalid endpoint address
    #[error("Invalid endpoint address: {0}")]
    InvalidAddress(String),

    /// Initialization failed
    #[error("Metrics initialization failed: {0}")]
    InitializationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_address_rejected() {
        let config = MetricsConfig {
            expose_endpoint: true,
            endpoint_address: "not-an-address".to_string(),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(MetricsError::InvalidAddress(_))
        ));
        assert!(render_metrics().is_empty());
    }
}
