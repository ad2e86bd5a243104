use tokio::signal;

use crate::realtime::channel::ControlChannel;

/// Resolves on Ctrl+C or SIGTERM, then tells every open control channel
/// connection to wind down.
pub(crate) async fn shutdown_signal(channel: ControlChannel) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    let open = channel.registry().len().await;
    channel.shutdown();
    tracing::info!(open_connections = open, "shutdown signal received");
}
