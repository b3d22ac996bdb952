//! InitKit runtime runner.
//!
//! Builds a [`StoreInitializer`] and keeps it reacting until shutdown.
//! Shutdown can be driven by OS signals, an external `CancellationToken`,
//! or an arbitrary future.

use std::{future::Future, pin::Pin};

use tokio_util::sync::CancellationToken;

use crate::registry::FeatureRegistry;
use crate::runtime::{InitSettings, StartupStatus, StoreHandles, StoreInitializer};

/// How the runtime should decide when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals (Ctrl+C / SIGTERM).
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// An arbitrary future; when it completes, we initiate shutdown.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

/// Options for running the session startup.
pub struct RunOptions {
    pub handles: StoreHandles,
    pub features: FeatureRegistry,
    pub settings: InitSettings,
    pub shutdown: ShutdownOptions,
}

/// Full cycle: mount → react on every input change → stop → drain.
pub async fn run(opts: RunOptions) -> anyhow::Result<StartupStatus> {
    let cancel = match &opts.shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };

    match opts.shutdown {
        ShutdownOptions::Signals => {
            let c = cancel.clone();
            tokio::spawn(async move {
                match initkit_bootstrap::wait_for_shutdown().await {
                    Ok(()) => tracing::info!("shutdown: signal received"),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "shutdown: primary waiter failed; falling back to ctrl_c()"
                        );
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
                c.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            let c = cancel.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                c.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::info!("shutdown: external token will control lifecycle");
        }
    }

    let initializer = StoreInitializer::new(opts.handles, opts.features, opts.settings, cancel);
    let status = initializer.run().await;

    tracing::info!(
        reactions = status.reactions,
        dispatches = status.dispatch_generation,
        plugin_ensure = ?status.plugin_ensure,
        "Session startup finished"
    );
    Ok(status)
}
