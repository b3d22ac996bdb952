use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::plugin::{InstalledPlugin, PluginDescriptor};

/// Agent configuration is opaque to the initializer; stores interpret it.
pub type AgentConfig = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultAgent {
    #[serde(default)]
    pub config: AgentConfig,
}

/// Remote/static configuration published by the [`ConfigSource`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(
        default,
        rename = "defaultAgent",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_agent: Option<DefaultAgent>,
    #[serde(default, rename = "oAuthSSOProviders")]
    pub oauth_sso_providers: Vec<String>,
}

impl ServerConfig {
    pub fn default_agent_config(&self) -> Option<&AgentConfig> {
        self.default_agent.as_ref().map(|a| &a.config)
    }
}

/// Current sign-in view of the auth store.
///
/// `is_login` accounts for the auth provider configuration, `is_signed_in` is
/// raw session presence. They disagree while providers are still resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_login: bool,
    pub is_signed_in: bool,
}

/// Result of a successful user-state initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInitState {
    pub is_onboard: Option<bool>,
    pub is_signed_in: bool,
}

/// What every feature store receives on dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInputs {
    pub effective_login: bool,
    pub server_config: Arc<ServerConfig>,
}

#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn server_config(&self) -> watch::Receiver<Arc<ServerConfig>>;

    /// Load (or refresh) the server config; publishes through `server_config`.
    async fn fetch_server_config(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AuthState: Send + Sync {
    fn auth(&self) -> watch::Receiver<AuthSnapshot>;

    async fn initialize_user_state(
        &self,
        effective_login: bool,
        server_config: &ServerConfig,
    ) -> anyhow::Result<UserInitState>;

    fn set_oauth_sso_providers(&self, providers: Vec<String>);
}

#[async_trait]
pub trait SystemStatusState: Send + Sync {
    /// Monotonic: flips to `true` once the local database finished its own
    /// startup and never reverts within a session.
    fn db_ready(&self) -> watch::Receiver<bool>;

    async fn initialize_system_status(&self) -> anyhow::Result<()>;

    fn set_is_mobile(&self, is_mobile: bool);

    fn set_navigator(&self, navigator: Arc<dyn Navigator>);
}

#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn initialize_inbox_agent(
        &self,
        effective_login: bool,
        default_agent_config: Option<&AgentConfig>,
    ) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ProviderCredentialStore: Send + Sync {
    async fn initialize_provider_credentials(&self, effective_login: bool) -> anyhow::Result<()>;
}

#[async_trait]
pub trait PluginRegistry: Send + Sync {
    async fn list_installed(&self) -> anyhow::Result<Vec<InstalledPlugin>>;

    async fn create(&self, descriptor: PluginDescriptor) -> anyhow::Result<()>;
}

/// Client-side navigation. Fire-and-forget from the initializer's view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str) -> anyhow::Result<()>;
}

pub trait ViewportSource: Send + Sync {
    fn is_mobile(&self) -> watch::Receiver<bool>;
}

/// Uniform seam the initializer dispatches through. Implementations must be
/// convergent: repeated calls with equal inputs must not refetch or mutate.
#[async_trait]
pub trait FeatureStore: Send + Sync {
    async fn initialize(&self, inputs: &FeatureInputs) -> anyhow::Result<()>;

    /// Part of the server config this store reads. A store is re-run only
    /// when the effective login or this slice changed since its last run.
    fn config_slice(&self, _config: &ServerConfig) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Feeds the inbox agent store with the login signal and the default agent slice.
pub struct InboxAgentFeature(pub Arc<dyn AgentStore>);

#[async_trait]
impl FeatureStore for InboxAgentFeature {
    async fn initialize(&self, inputs: &FeatureInputs) -> anyhow::Result<()> {
        self.0
            .initialize_inbox_agent(
                inputs.effective_login,
                inputs.server_config.default_agent_config(),
            )
            .await
    }

    fn config_slice(&self, config: &ServerConfig) -> serde_json::Value {
        config
            .default_agent_config()
            .map_or(serde_json::Value::Null, |c| serde_json::Value::Object(c.clone()))
    }
}

pub struct ProviderCredentialsFeature(pub Arc<dyn ProviderCredentialStore>);

#[async_trait]
impl FeatureStore for ProviderCredentialsFeature {
    async fn initialize(&self, inputs: &FeatureInputs) -> anyhow::Result<()> {
        self.0
            .initialize_provider_credentials(inputs.effective_login)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_uses_wire_names() {
        let cfg: ServerConfig = serde_json::from_value(serde_json::json!({
            "defaultAgent": { "config": { "model": "claude-sonnet-4-20250514" } },
            "oAuthSSOProviders": ["github", "google"]
        }))
        .unwrap();

        assert_eq!(cfg.oauth_sso_providers, vec!["github", "google"]);
        assert_eq!(
            cfg.default_agent_config().unwrap()["model"],
            "claude-sonnet-4-20250514"
        );
    }

    #[test]
    fn missing_default_agent_yields_no_slice() {
        let cfg: ServerConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.default_agent_config().is_none());
        assert!(cfg.oauth_sso_providers.is_empty());
    }

    struct NoAgents;

    #[async_trait]
    impl AgentStore for NoAgents {
        async fn initialize_inbox_agent(
            &self,
            _effective_login: bool,
            _default_agent_config: Option<&AgentConfig>,
        ) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl ProviderCredentialStore for NoAgents {
        async fn initialize_provider_credentials(&self, _effective_login: bool) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn feature_slices_ignore_unrelated_config() {
        let with_providers: ServerConfig = serde_json::from_value(serde_json::json!({
            "oAuthSSOProviders": ["github"]
        }))
        .unwrap();
        let with_agent: ServerConfig = serde_json::from_value(serde_json::json!({
            "defaultAgent": { "config": { "model": "gpt-4o" } }
        }))
        .unwrap();

        let inbox = InboxAgentFeature(Arc::new(NoAgents));
        assert_eq!(
            inbox.config_slice(&ServerConfig::default()),
            inbox.config_slice(&with_providers)
        );
        assert_eq!(inbox.config_slice(&with_agent)["model"], "gpt-4o");

        let credentials = ProviderCredentialsFeature(Arc::new(NoAgents));
        assert_eq!(credentials.config_slice(&with_agent), serde_json::Value::Null);
    }
}
