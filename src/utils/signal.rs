use tokio::signal;

/// Resolves once Ctrl+C is received; used for axum's graceful shutdown.
pub async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }

    #[cfg(not(windows))]
    println!();
    tracing::info!("Ctrl+C received, draining in-flight requests.");
}
