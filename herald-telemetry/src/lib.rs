//! # Herald Telemetry
//!
//! Logging and metrics for the Herald notification server.
//!
//! This crate provides:
//! - JSON and pretty log formats
//! - Stdout and rolling file outputs
//! - `RUST_LOG` aware level filtering
//! - Prometheus metrics export

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Logging configuration and initialization
pub mod logging;

/// Metrics collection and export
pub mod metrics;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogOutput, LoggingError, init_logging};
    pub use crate::metrics::{HeraldMetrics, MetricsConfig, init_metrics, render_metrics};
}
