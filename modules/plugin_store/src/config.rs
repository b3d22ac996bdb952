use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Memory,
    Remote,
}

/// Configuration for the plugin_store module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginStoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Root of the plugin service; `{base_url}/plugins` is the collection.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Identifiers the in-memory backend starts with.
    #[serde(default)]
    pub preinstalled: Vec<String>,
}

impl Default for PluginStoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            preinstalled: Vec::new(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use initkit_bootstrap::{AppConfig, AppConfigProvider, ConfigProviderExt};
    use serde_json::json;

    #[test]
    fn missing_section_defaults_to_memory() {
        let provider = AppConfigProvider::new(AppConfig::default());
        let cfg: PluginStoreConfig = provider.module_config(crate::MODULE_NAME).unwrap();
        assert_eq!(cfg.backend, Backend::Memory);
        assert_eq!(cfg.timeout_secs, 10);
    }

    #[test]
    fn remote_section_parses() {
        let mut app = AppConfig::default();
        app.modules.insert(
            crate::MODULE_NAME.to_string(),
            json!({ "backend": "remote", "base_url": "http://127.0.0.1:8087/api", "timeout_secs": 3 }),
        );
        let provider = AppConfigProvider::new(app);

        let cfg: PluginStoreConfig = provider.module_config(crate::MODULE_NAME).unwrap();
        assert_eq!(cfg.backend, Backend::Remote);
        assert_eq!(cfg.base_url.as_deref(), Some("http://127.0.0.1:8087/api"));
        assert_eq!(cfg.timeout_secs, 3);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut app = AppConfig::default();
        app.modules.insert(
            crate::MODULE_NAME.to_string(),
            json!({ "backend": "memory", "retries": 3 }),
        );
        let provider = AppConfigProvider::new(app);

        let err = provider
            .module_config::<PluginStoreConfig>(crate::MODULE_NAME)
            .unwrap_err();
        assert!(err.to_string().contains("plugin_store"));
    }
}
