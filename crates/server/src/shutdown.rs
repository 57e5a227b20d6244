//! Graceful shutdown
//!
//! Shutdown is coordinated through `tokio_util::sync::CancellationToken`;
//! child tokens are cancelled with their parent.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owns the root cancellation token of the process.
///
/// ```ignore
/// let shutdown = ShutdownController::with_ctrl_c();
/// let token = shutdown.child_token();
/// tokio::spawn(async move { server.run(token).await });
/// shutdown.wait_for_shutdown().await;
/// ```
#[derive(Clone, Default)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller cancelled on Ctrl+C, or SIGTERM on unix
    pub fn with_ctrl_c() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            let signal = wait_for_signal().await;
            info!(signal, "Initiating graceful shutdown");
            token.cancel();
        });

        controller
    }

    /// Token cancelled with this controller, cancellable on its own
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn shutdown(&self) {
        info!("Manual shutdown triggered");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }
}

/// Root token cancelled on Ctrl+C / SIGTERM
pub fn shutdown_signal() -> CancellationToken {
    ShutdownController::with_ctrl_c().token()
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!("Failed to listen for SIGTERM: {}", e);
            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        // Never resolve; shutdown must then come from the token
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
