use initkit_bootstrap::DefaultPluginConfig;
use serde::{Deserialize, Serialize};

/// Settings blob attached to an installed plugin.
pub type PluginSettings = serde_json::Map<String, serde_json::Value>;

/// Entry as reported by [`crate::PluginRegistry::list_installed`]. Only the
/// identifier matters to the initializer; everything else is carried along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    pub identifier: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InstalledPlugin {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PluginKind {
    CustomPlugin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiMode {
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManifestMode {
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum McpTransport {
    Http,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum McpAuth {
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpParams {
    pub auth: McpAuth,
    #[serde(rename = "type")]
    pub transport: McpTransport,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPluginParams {
    pub api_mode: ApiMode,
    pub avatar: String,
    pub description: String,
    pub enable_settings: bool,
    pub manifest_mode: ManifestMode,
    pub mcp: McpParams,
}

/// Declarative description of a plugin to install.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: PluginKind,
    pub custom_params: CustomPluginParams,
    #[serde(default)]
    pub settings: PluginSettings,
}

/// Fixed manifest of the default integration: simple API mode, no auth,
/// HTTP transport against the configured URL.
pub fn default_plugin_descriptor(cfg: &DefaultPluginConfig) -> PluginDescriptor {
    PluginDescriptor {
        identifier: cfg.identifier.clone(),
        kind: PluginKind::CustomPlugin,
        custom_params: CustomPluginParams {
            api_mode: ApiMode::Simple,
            avatar: cfg.avatar.clone(),
            description: cfg.description.clone(),
            enable_settings: false,
            manifest_mode: ManifestMode::Url,
            mcp: McpParams {
                auth: McpAuth::None,
                transport: McpTransport::Http,
                url: cfg.url.clone(),
            },
        },
        settings: PluginSettings::new(),
    }
}
