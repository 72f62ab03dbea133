//! Main server implementation.
//!
//! Wires the store, session registry, dispatcher and notification service
//! together, then runs the API server and the in-process event listener
//! until shutdown.

use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};

use herald_api::{ApiServer, AppState};
use herald_core::config::ConfigLoader;
use herald_core::dispatcher::DeliveryDispatcher;
use herald_core::events::{EventPublisher, event_bus, run_event_listener};
use herald_core::record::InboundEvent;
use herald_core::service::NotificationService;
use herald_core::session::SessionRegistry;
use herald_core::store::open_store;
use herald_telemetry::metrics::init_metrics;

use crate::config::ServerConfig;
use crate::shutdown::{ShutdownController, setup_signal_handlers};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "HERALD";

/// The assembled notification server.
#[derive(Debug)]
pub struct HeraldServer {
    config: ServerConfig,
    shutdown: ShutdownController,
    state: Arc<AppState>,
    publisher: EventPublisher,
    event_rx: mpsc::Receiver<InboundEvent>,
}

impl HeraldServer {
    /// Loads configuration from `path`, applies `HERALD_*` overrides and
    /// validates it. A missing file yields the defaults.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig, ServerError> {
        ConfigLoader::new()
            .with_env_prefix(ENV_PREFIX)
            .allow_missing(true)
            .load(path)
            .map_err(|e| ServerError::ConfigError(e.to_string()))
    }

    /// Opens the store and composes every component.
    pub async fn build(config: ServerConfig) -> Result<Self, ServerError> {
        info!("Initializing Herald server...");

        let store = open_store(&config.storage)
            .await
            .map_err(|e| ServerError::InitializationError(format!("Failed to open store: {e}")))?;
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = Arc::new(DeliveryDispatcher::new(
            registry,
            config.delivery.clone(),
            config.api.monitor_channel.clone(),
        ));
        let service = Arc::new(NotificationService::new(store, dispatcher));
        let (publisher, event_rx) = event_bus(&config.events);
        let state = Arc::new(AppState::new(config.api.clone(), service));

        info!(
            backend = ?config.storage.backend,
            monitor_channel = %config.api.monitor_channel,
            "Herald server initialized"
        );

        Ok(Self {
            config,
            shutdown: ShutdownController::new(),
            state,
            publisher,
            event_rx,
        })
    }

    /// Shared API state.
    #[must_use]
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Handle for in-process producers to enqueue events.
    #[must_use]
    pub fn publisher(&self) -> EventPublisher {
        self.publisher.clone()
    }

    /// The shutdown controller driving this server.
    #[must_use]
    pub fn shutdown_controller(&self) -> &ShutdownController {
        &self.shutdown
    }

    /// Binds the configured address, installs signal handlers and runs until
    /// shutdown.
    pub async fn run(self) -> Result<(), ServerError> {
        self.init_metrics();

        let api_server = ApiServer::new(Arc::clone(&self.state));
        let listener = api_server
            .bind()
            .await
            .map_err(|e| ServerError::InitializationError(e.to_string()))?;

        let shutdown_ctrl = self.shutdown.clone();
        tokio::spawn(async move {
            setup_signal_handlers(shutdown_ctrl).await;
        });

        self.run_on(listener).await
    }

    fn init_metrics(&self) {
        if !self.config.metrics.enabled {
            info!("Metrics disabled");
            return;
        }
        if let Err(e) = init_metrics(&self.config.metrics) {
            warn!("Metrics initialization: {}", e);
        } else {
            info!(
                expose_endpoint = self.config.metrics.expose_endpoint,
                "Metrics initialized"
            );
        }
    }

    /// Runs on an already bound listener until shutdown is initiated through
    /// the controller.
    pub async fn run_on(self, listener: TcpListener) -> Result<(), ServerError> {
        let Self {
            config,
            shutdown,
            state,
            publisher: _publisher,
            event_rx,
        } = self;

        let listener_shutdown = shutdown.clone();
        let events = tokio::spawn(run_event_listener(
            Arc::clone(&state.service),
            event_rx,
            async move { listener_shutdown.wait_for_shutdown().await },
        ));

        // Push sessions outlive the HTTP connections that opened them, so
        // they are closed explicitly once the signal fires.
        let api_shutdown = shutdown.clone();
        let registry = Arc::clone(state.registry());
        let shutdown_signal = async move {
            api_shutdown.wait_for_shutdown().await;
            let open = registry.len();
            registry.for_each(|_, channel| channel.close());
            info!(open_sessions = open, "Closed push sessions");
        };

        info!(address = %config.api.bind_address(), "Herald server running");

        ApiServer::new(state)
            .serve(listener, shutdown_signal)
            .await
            .map_err(|e| ServerError::RuntimeError(format!("API server error: {e}")))?;

        info!("Performing graceful shutdown...");
        match tokio::time::timeout(config.shutdown.timeout(), events).await {
            Ok(Ok(ingested)) => info!(ingested, "Event listener stopped"),
            Ok(Err(e)) => warn!(error = %e, "Event listener task failed"),
            Err(_) => warn!("Event listener did not stop in time"),
        }

        shutdown.mark_complete();
        info!("Graceful shutdown complete");
        Ok(())
    }
}

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A component failed to start.
    #[error("Initialization error: {0}")]
    InitializationError(String),

    /// The server failed while running.
    #[error("Runtime error: {0}")]
    RuntimeError(String),
}
