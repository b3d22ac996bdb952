use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use initkit::ProviderCredentialStore;

use crate::config::ProviderDefaults;

/// Provider switches visible to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    /// Credentials are scoped to the user once the session is logged in.
    pub user_scoped: bool,
    pub enabled: BTreeMap<String, bool>,
}

impl ProviderCredentials {
    pub fn enabled_providers(&self) -> Vec<&str> {
        self.enabled
            .iter()
            .filter(|(_, on)| **on)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

pub struct SessionCredentialStore {
    defaults: BTreeMap<String, bool>,
    current: RwLock<Option<ProviderCredentials>>,
    loads: Mutex<usize>,
}

impl SessionCredentialStore {
    pub fn new(providers: &ProviderDefaults) -> Self {
        Self {
            defaults: providers.enabled.clone(),
            current: RwLock::new(None),
            loads: Mutex::new(0),
        }
    }

    pub fn current(&self) -> Option<ProviderCredentials> {
        self.current.read().clone()
    }

    pub fn loads(&self) -> usize {
        *self.loads.lock()
    }
}

#[async_trait]
impl ProviderCredentialStore for SessionCredentialStore {
    #[instrument(name = "session_stores.credentials.initialize", skip(self))]
    async fn initialize_provider_credentials(&self, effective_login: bool) -> anyhow::Result<()> {
        let mut current = self.current.write();
        if current.as_ref().map(|c| c.user_scoped) == Some(effective_login) {
            debug!("Provider credentials already initialized");
            return Ok(());
        }

        let credentials = ProviderCredentials {
            user_scoped: effective_login,
            enabled: self.defaults.clone(),
        };
        info!(
            enabled = ?credentials.enabled_providers(),
            "Provider credentials initialized"
        );
        *current = Some(credentials);
        *self.loads.lock() += 1;
        Ok(())
    }
}
