//! Process signals

use tracing::{info, warn};

/// Returns a future that resolves when SIGINT or SIGTERM is received
///
/// Handlers are installed immediately, so signals arriving before the future
/// is first polled are not lost. If they cannot be installed the future never
/// resolves and the process keeps the default signal behaviour.
#[cfg(unix)]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send {
    use tokio::signal::unix::{SignalKind, signal};

    let handlers = match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
        (Ok(sigint), Ok(sigterm)) => Some((sigint, sigterm)),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Failed to install signal handlers: {}", e);
            None
        }
    };

    async move {
        let Some((mut sigint, mut sigterm)) = handlers else {
            return std::future::pending().await;
        };

        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }
}

/// Returns a future that resolves on Ctrl+C
#[cfg(not(unix))]
pub fn shutdown_signal() -> impl Future<Output = ()> + Send {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            return std::future::pending().await;
        }
        info!("Received Ctrl+C");
    }
}
