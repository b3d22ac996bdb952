use anyhow::Result;
use tokio::signal;

/// Resolve once the process receives Ctrl+C or (on unix) SIGTERM.
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .inspect_err(|e| tracing::error!(%e, "Failed to install SIGTERM handler"))?;

        tokio::select! {
            res = signal::ctrl_c() => {
                res?;
                tracing::info!("Received Ctrl+C signal");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM signal");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C signal");
    }

    tracing::info!("Shutdown signal received, stopping session startup");
    Ok(())
}
