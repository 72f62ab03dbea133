//! # Herald Server
//!
//! Process entry point for the Herald notification service.
//!
//! This crate provides:
//! - Configuration loading with `HERALD_*` environment overrides
//! - Component wiring (store, session registry, dispatcher, service)
//! - The in-process event listener
//! - Graceful shutdown on SIGINT/SIGTERM

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod server;
pub mod shutdown;

pub use config::{CliOverrides, ServerConfig};
pub use server::{HeraldServer, ServerError};
pub use shutdown::ShutdownController;
