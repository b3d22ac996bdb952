use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info};

use initkit::{ConfigSource, ServerConfig};

/// Serves a server config fixed at construction. Subscribers see the empty
/// default until `fetch_server_config` publishes it.
pub struct StaticConfigSource {
    tx: watch::Sender<Arc<ServerConfig>>,
    loaded: Arc<ServerConfig>,
}

impl StaticConfigSource {
    pub fn new(loaded: ServerConfig) -> Self {
        let (tx, _) = watch::channel(Arc::new(ServerConfig::default()));
        Self {
            tx,
            loaded: Arc::new(loaded),
        }
    }

    pub fn current(&self) -> Arc<ServerConfig> {
        self.tx.borrow().clone()
    }

    /// Replace the served config, as a refresh from the server would.
    pub fn publish(&self, next: ServerConfig) {
        self.tx.send_if_modified(|cur| {
            if **cur == next {
                return false;
            }
            *cur = Arc::new(next);
            true
        });
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    fn server_config(&self) -> watch::Receiver<Arc<ServerConfig>> {
        self.tx.subscribe()
    }

    async fn fetch_server_config(&self) -> anyhow::Result<()> {
        let loaded = Arc::clone(&self.loaded);
        let changed = self.tx.send_if_modified(|cur| {
            if *cur == loaded {
                return false;
            }
            *cur = loaded;
            true
        });
        if changed {
            info!(
                oauth_sso_providers = self.loaded.oauth_sso_providers.len(),
                has_default_agent = self.loaded.default_agent.is_some(),
                "Server config loaded"
            );
        } else {
            debug!("Server config unchanged");
        }
        Ok(())
    }
}
