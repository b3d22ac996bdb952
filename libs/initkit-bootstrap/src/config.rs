use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Identifier reserved for the integration installed on every session.
pub const DEFAULT_PLUGIN_IDENTIFIER: &str = "facebook-meta-mcp-server";

/// Main application configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Session startup switches.
    #[serde(default)]
    pub startup: StartupConfig,
    /// Integration that is ensured once the local store is ready.
    #[serde(default)]
    pub default_plugin: DefaultPluginConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StartupConfig {
    /// Deployment-level switch: when on, the raw session presence decides
    /// whether the session counts as logged in.
    #[serde(default)]
    pub auth_mode_enabled: bool,
    /// Where users that have not finished onboarding are sent.
    #[serde(default = "default_onboarding_path")]
    pub onboarding_path: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            auth_mode_enabled: false,
            onboarding_path: default_onboarding_path(),
        }
    }
}

fn default_onboarding_path() -> String {
    "/onboard".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DefaultPluginConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_plugin_identifier")]
    pub identifier: String,
    #[serde(default = "default_plugin_url")]
    pub url: String,
    #[serde(default = "default_plugin_description")]
    pub description: String,
    #[serde(default = "default_plugin_avatar")]
    pub avatar: String,
}

impl Default for DefaultPluginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            identifier: default_plugin_identifier(),
            url: default_plugin_url(),
            description: default_plugin_description(),
            avatar: default_plugin_avatar(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_plugin_identifier() -> String {
    DEFAULT_PLUGIN_IDENTIFIER.to_string()
}

fn default_plugin_url() -> String {
    "https://facebook-meta-mcp-server.vercel.app/mcp".to_string()
}

fn default_plugin_description() -> String {
    "Facebook Meta MCP server providing AI model capabilities and tools".to_string()
}

fn default_plugin_avatar() -> String {
    "🧠".to_string()
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    #[serde(default)]
    pub file: String, // "logs/initkit.log", empty disables the file sink
    #[serde(default)]
    pub file_level: String,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: String::new(),
            file_level: "debug".to_string(),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            startup: StartupConfig::default(),
            default_plugin: DefaultPluginConfig::default(),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        // Logging stays None unless YAML/ENV provides it.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(config_path.as_ref()))
            // Example: APP__STARTUP__AUTH_MODE_ENABLED=true maps to startup.auth_mode_enabled
            .merge(Env::prefixed("APP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        if let Some(dir) = config.modules_dir.clone() {
            let base_dir = config_path
                .as_ref()
                .parent()
                .unwrap_or_else(|| Path::new("."));
            merge_module_files(&mut config.modules, base_dir.join(dir))?;
        }

        Ok(config)
    }

    /// Load configuration from file or fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => Ok(Self::default()),
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if args.auth_mode {
            self.startup.auth_mode_enabled = true;
        }

        // Set logging level based on verbose flags for "default" section.
        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }
}

/// Command line overrides applied on top of the layered config.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub verbose: u8,
    pub auth_mode: bool,
}

fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    use std::fs;
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext != "yml" && ext != "yaml" {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read module config {}", path.display()))?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?;
        bag.insert(name.to_string(), serde_json::to_value(val)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
