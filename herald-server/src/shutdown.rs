//! Graceful shutdown handling.
//!
//! A [`ShutdownController`] is shared by every long-running task. The signal
//! handler (or a test) initiates shutdown once; tasks observe it through
//! [`ShutdownController::wait_for_shutdown`], and the server reports the end
//! of cleanup with [`ShutdownController::mark_complete`].

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Shutdown controller for coordinating graceful shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownController {
    /// Flips to `true` once shutdown is initiated.
    shutdown_tx: Arc<watch::Sender<bool>>,
    /// Flips to `true` once cleanup is done.
    completion_tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    /// Creates a new shutdown controller.
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (completion_tx, _) = watch::channel(false);

        Self {
            shutdown_tx: Arc::new(shutdown_tx),
            completion_tx: Arc::new(completion_tx),
        }
    }

    /// Initiates shutdown. Only the first call has an effect.
    pub fn initiate_shutdown(&self) {
        if self.shutdown_tx.send_if_modified(|initiated| !std::mem::replace(initiated, true)) {
            info!("Shutdown initiated");
        }
    }

    /// Returns whether shutdown has been initiated.
    #[must_use]
    pub fn is_shutdown_initiated(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Completes once shutdown is initiated, immediately if it already was.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown_tx.subscribe();
        let _ = rx.wait_for(|initiated| *initiated).await;
    }

    /// Marks shutdown as complete.
    pub fn mark_complete(&self) {
        self.completion_tx.send_replace(true);
    }

    /// Waits for shutdown to complete with a timeout.
    ///
    /// Returns `true` if shutdown completed, `false` if the timeout elapsed.
    pub async fn wait_for_completion(&self, timeout: Duration) -> bool {
        let mut rx = self.completion_tx.subscribe();
        let completed = tokio::time::timeout(timeout, rx.wait_for(|done| *done))
            .await
            .is_ok_and(|result| result.is_ok());

        if !completed {
            warn!(?timeout, "Shutdown completion timeout");
        }
        completed
    }
}

/// Waits for SIGINT or SIGTERM and initiates shutdown.
///
/// If a handler cannot be installed, the failure is logged and shutdown is
/// only reachable through the controller.
pub async fn setup_signal_handlers(controller: ShutdownController) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                (Err(e), _) | (_, Err(e)) => {
                    error!(error = %e, "Failed to install signal handlers");
                    return;
                }
            };

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT (Ctrl+C)");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }

        controller.initiate_shutdown();
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }
        info!("Received Ctrl+C");
        controller.initiate_shutdown();
    }
}
