//! Graceful shutdown signal handling, grounded on
//! `nvisy_cli::server::shutdown::shutdown_signal` (trimmed: no timeout
//! parameter here — the drain deadline is `ClusterController::shutdown`'s
//! job, not the signal wait's).

const TRACING_TARGET_SHUTDOWN: &str = "forge_cli::shutdown";

/// Resolves once SIGINT (Ctrl+C, all platforms) or SIGTERM (Unix) arrives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(target: TRACING_TARGET_SHUTDOWN, %error, "failed to install Ctrl+C handler");
        } else {
            tracing::info!(target: TRACING_TARGET_SHUTDOWN, "received Ctrl+C, starting graceful shutdown");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(target: TRACING_TARGET_SHUTDOWN, "received SIGTERM, starting graceful shutdown");
            }
            Err(error) => {
                tracing::error!(target: TRACING_TARGET_SHUTDOWN, %error, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
