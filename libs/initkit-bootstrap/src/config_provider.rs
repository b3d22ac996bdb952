use crate::config::AppConfig;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Configuration provider trait for modules
pub trait ConfigProvider: Send + Sync {
    /// Get the configuration for a specific module
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("module '{module}' config is invalid")]
    InvalidModuleConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait ConfigProviderExt: ConfigProvider {
    /// Deserialize a module section, falling back to `T::default()` when the
    /// section is absent. A present but malformed section is an error.
    fn module_config<T>(&self, module_name: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        match self.get_module_config(module_name) {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|source| {
                ConfigError::InvalidModuleConfig {
                    module: module_name.to_string(),
                    source,
                }
            }),
        }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}

/// Implementation of ConfigProvider that uses AppConfig
pub struct AppConfigProvider(Arc<AppConfig>);

impl AppConfigProvider {
    pub fn new(config: AppConfig) -> Self {
        Self(Arc::new(config))
    }

    pub fn from_arc(config: Arc<AppConfig>) -> Self {
        Self(config)
    }

    pub fn inner(&self) -> &AppConfig {
        &self.0
    }
}

impl ConfigProvider for AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.modules.get(module_name)
    }
}
