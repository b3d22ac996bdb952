//! In-process stores for one client session.
//!
//! Each store implements one collaborator contract of the session startup.
//! [`SessionStores`] builds them from the `modules.session_stores` config
//! section and hands them to the initializer.

pub mod agent;
pub mod auth;
pub mod config;
pub mod config_source;
pub mod credentials;
pub mod navigator;
pub mod system;
pub mod viewport;

use std::sync::Arc;
use std::time::Duration;

use initkit::{
    FeatureRegistry, InboxAgentFeature, PluginRegistry, ProviderCredentialsFeature, RegistryError,
    StoreHandles,
};
use initkit_bootstrap::{ConfigError, ConfigProvider, ConfigProviderExt};

pub use agent::{InboxAgent, InboxAgentStore};
pub use auth::SessionAuthStore;
pub use config::SessionStoresConfig;
pub use config_source::StaticConfigSource;
pub use credentials::{ProviderCredentials, SessionCredentialStore};
pub use navigator::LoggingNavigator;
pub use system::SystemStatusStore;
pub use viewport::StaticViewport;

/// Module name of the `modules.session_stores` config section.
pub const MODULE_NAME: &str = "session_stores";

/// Store names as registered in the feature registry.
pub const INBOX_AGENT: &str = "inbox_agent";
pub const PROVIDER_CREDENTIALS: &str = "provider_credentials";

/// All stores of one session, concrete so the host can inspect them.
pub struct SessionStores {
    pub config: Arc<StaticConfigSource>,
    pub auth: Arc<SessionAuthStore>,
    pub system: Arc<SystemStatusStore>,
    pub viewport: Arc<StaticViewport>,
    pub navigator: Arc<LoggingNavigator>,
    pub agents: Arc<InboxAgentStore>,
    pub credentials: Arc<SessionCredentialStore>,
}

impl SessionStores {
    pub fn new(cfg: &SessionStoresConfig, auth_mode_enabled: bool) -> Self {
        Self {
            config: Arc::new(StaticConfigSource::new(cfg.server.clone())),
            auth: Arc::new(SessionAuthStore::new(
                auth_mode_enabled,
                cfg.session.signed_in,
                cfg.session.onboarded,
            )),
            system: Arc::new(SystemStatusStore::new(Duration::from_millis(
                cfg.db_init_delay_ms,
            ))),
            viewport: Arc::new(StaticViewport::new(cfg.session.is_mobile)),
            navigator: Arc::new(LoggingNavigator::default()),
            agents: Arc::new(InboxAgentStore::new(&cfg.providers)),
            credentials: Arc::new(SessionCredentialStore::new(&cfg.providers)),
        }
    }

    /// Read the module section and build the stores.
    pub fn from_provider(
        provider: &dyn ConfigProvider,
        auth_mode_enabled: bool,
    ) -> Result<Self, ConfigError> {
        let cfg: SessionStoresConfig = provider.module_config(MODULE_NAME)?;
        tracing::debug!(
            db_init_delay_ms = cfg.db_init_delay_ms,
            signed_in = cfg.session.signed_in,
            "Loaded session_stores config"
        );
        Ok(Self::new(&cfg, auth_mode_enabled))
    }

    pub fn handles(&self, plugins: Arc<dyn PluginRegistry>) -> StoreHandles {
        StoreHandles {
            config: self.config.clone(),
            auth: self.auth.clone(),
            system: self.system.clone(),
            plugins,
            navigator: self.navigator.clone(),
            viewport: self.viewport.clone(),
        }
    }

    /// Inbox agent and provider credentials are independent and share a level.
    pub fn feature_registry(&self) -> Result<FeatureRegistry, RegistryError> {
        let mut b = FeatureRegistry::builder();
        b.register(
            INBOX_AGENT,
            &[],
            Arc::new(InboxAgentFeature(self.agents.clone())),
        )
        .register(
            PROVIDER_CREDENTIALS,
            &[],
            Arc::new(ProviderCredentialsFeature(self.credentials.clone())),
        );
        b.build()
    }
}
