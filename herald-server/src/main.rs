//! # Herald Server
//!
//! Real-time notification service.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! herald-server
//!
//! # Run with custom configuration file
//! herald-server --config /path/to/herald.yaml
//!
//! # Run with environment variable overrides
//! HERALD_PORT=9090 HERALD_JWT_SECRET=... herald-server
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use herald_server::{CliOverrides, HeraldServer, ServerConfig};
use herald_telemetry::logging::init_logging;

/// Herald notification server
#[derive(Parser, Debug)]
#[command(name = "herald-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "herald.yaml")]
    config: PathBuf,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Override server port
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    if args.validate {
        println!("Configuration is valid");
        return;
    }

    let _log_guards = match init_logging(&config.logging) {
        Ok(guards) => guards,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    match run_server(config).await {
        Ok(()) => info!("Herald server stopped"),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Server error");
            std::process::exit(1);
        }
    }
}

/// Loads configuration from file and applies command-line overrides.
fn load_config(args: &Args) -> anyhow::Result<ServerConfig> {
    let config = HeraldServer::load_config(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;

    let overrides = CliOverrides {
        host: args.host.clone(),
        port: args.port,
        debug: args.debug,
    };
    config
        .with_overrides(&overrides)
        .context("applying command-line overrides")
}

async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let server = HeraldServer::build(config).await?;
    server.run().await?;
    Ok(())
}
