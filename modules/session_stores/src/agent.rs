use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::{debug, info, instrument};

use initkit::{AgentConfig, AgentStore};

use crate::config::ProviderDefaults;

/// The inbox agent as the agent store holds it after initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct InboxAgent {
    pub config: AgentConfig,
    /// Whether the agent is backed by a signed-in user or the local guest.
    pub signed_in: bool,
}

pub struct InboxAgentStore {
    defaults: AgentConfig,
    inbox: RwLock<Option<InboxAgent>>,
    last_inputs: Mutex<Option<(bool, Option<AgentConfig>)>>,
    loads: Mutex<usize>,
}

impl InboxAgentStore {
    pub fn new(providers: &ProviderDefaults) -> Self {
        let mut defaults = AgentConfig::new();
        defaults.insert("model".into(), Value::String(providers.model.clone()));
        defaults.insert("provider".into(), Value::String(providers.provider.clone()));
        Self {
            defaults,
            inbox: RwLock::new(None),
            last_inputs: Mutex::new(None),
            loads: Mutex::new(0),
        }
    }

    pub fn inbox(&self) -> Option<InboxAgent> {
        self.inbox.read().clone()
    }

    pub fn loads(&self) -> usize {
        *self.loads.lock()
    }
}

#[async_trait]
impl AgentStore for InboxAgentStore {
    #[instrument(name = "session_stores.agent.initialize_inbox", skip(self, default_agent_config))]
    async fn initialize_inbox_agent(
        &self,
        effective_login: bool,
        default_agent_config: Option<&AgentConfig>,
    ) -> anyhow::Result<()> {
        let inputs = (effective_login, default_agent_config.cloned());
        {
            let mut last = self.last_inputs.lock();
            if last.as_ref() == Some(&inputs) {
                debug!("Inbox agent inputs unchanged");
                return Ok(());
            }
            *last = Some(inputs);
        }

        // Server defaults override the built-in model and provider.
        let mut config = self.defaults.clone();
        if let Some(overrides) = default_agent_config {
            config.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        info!(model = ?config.get("model"), "Inbox agent initialized");
        *self.inbox.write() = Some(InboxAgent {
            config,
            signed_in: effective_login,
        });
        *self.loads.lock() += 1;
        Ok(())
    }
}
