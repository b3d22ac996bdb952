use std::collections::BTreeMap;

use initkit::ServerConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROVIDER: &str = "anthropic";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Configuration for the session_stores module
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionStoresConfig {
    /// Server config published once `fetch_server_config` runs.
    #[serde(default)]
    pub server: ServerConfig,
    /// Simulated duration of the local database startup.
    #[serde(default)]
    pub db_init_delay_ms: u64,
    #[serde(default)]
    pub session: SessionSeed,
    #[serde(default)]
    pub providers: ProviderDefaults,
}

/// Initial values of the session flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSeed {
    #[serde(default)]
    pub signed_in: bool,
    #[serde(default = "default_true")]
    pub onboarded: bool,
    #[serde(default)]
    pub is_mobile: bool,
}

impl Default for SessionSeed {
    fn default() -> Self {
        Self {
            signed_in: false,
            onboarded: true,
            is_mobile: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderDefaults {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// provider id → enabled
    #[serde(default = "default_enabled")]
    pub enabled: BTreeMap<String, bool>,
}

impl Default for ProviderDefaults {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            enabled: default_enabled(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_enabled() -> BTreeMap<String, bool> {
    [("anthropic", true), ("ollama", false), ("openai", false)]
        .into_iter()
        .map(|(id, on)| (id.to_string(), on))
        .collect()
}
