use super::*;
use crate::{AppConfigProvider, ConfigProviderExt};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert!(!config.startup.auth_mode_enabled);
    assert_eq!(config.startup.onboarding_path, "/onboard");

    assert!(config.default_plugin.enabled);
    assert_eq!(config.default_plugin.identifier, "facebook-meta-mcp-server");
    assert_eq!(
        config.default_plugin.url,
        "https://facebook-meta-mcp-server.vercel.app/mcp"
    );

    let logging = config.logging.as_ref().unwrap();
    assert_eq!(logging["default"].console_level, "info");

    assert!(config.modules.is_empty());
}

#[test]
fn test_yaml_serialization() {
    let yaml = AppConfig::default()
        .to_yaml()
        .expect("Failed to serialize to YAML");

    assert!(yaml.contains("startup:"));
    assert!(yaml.contains("default_plugin:"));
    assert!(yaml.contains("logging:"));
    assert!(yaml.contains("modules:"));
}

#[test]
fn test_layered_loading_yaml_only() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("test-config.yaml");

    let yaml_content = r#"
startup:
  auth_mode_enabled: true
  onboarding_path: "/welcome"

default_plugin:
  url: "https://plugins.internal/mcp"

modules:
  session_stores:
    db_init_delay_ms: 10
"#;

    fs::write(&config_path, yaml_content).expect("Failed to write config file");

    let config = AppConfig::load_layered(&config_path).expect("Failed to load config");

    assert!(config.startup.auth_mode_enabled);
    assert_eq!(config.startup.onboarding_path, "/welcome");
    assert_eq!(config.default_plugin.url, "https://plugins.internal/mcp");
    // untouched fields keep their defaults
    assert_eq!(config.default_plugin.identifier, DEFAULT_PLUGIN_IDENTIFIER);
    assert!(config.logging.is_none());
    assert_eq!(config.modules["session_stores"]["db_init_delay_ms"], 10);
}

#[test]
fn test_env_overrides_yaml() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.yaml",
            r#"
startup:
  auth_mode_enabled: false
"#,
        )?;
        jail.set_env("APP__STARTUP__AUTH_MODE_ENABLED", "true");
        jail.set_env("APP__DEFAULT_PLUGIN__ENABLED", "false");

        let config = AppConfig::load_layered("config.yaml")
            .map_err(|e| figment::Error::from(e.to_string()))?;
        assert!(config.startup.auth_mode_enabled);
        assert!(!config.default_plugin.enabled);
        Ok(())
    });
}

#[test]
fn test_modules_dir_is_merged() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let modules_dir = temp_dir.path().join("modules.d");
    fs::create_dir_all(&modules_dir).unwrap();
    fs::write(
        modules_dir.join("plugin_store.yaml"),
        "backend: remote\nbase_url: \"http://localhost:9000\"\n",
    )
    .unwrap();
    fs::write(modules_dir.join("notes.txt"), "ignored").unwrap();

    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, "modules_dir: \"modules.d\"\n").unwrap();

    let config = AppConfig::load_layered(&config_path).expect("Failed to load config");
    assert_eq!(config.modules.len(), 1);
    assert_eq!(config.modules["plugin_store"]["backend"], "remote");
}

#[test]
fn test_unknown_startup_field_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("invalid-config.yaml");
    fs::write(&config_path, "startup:\n  auth_mode: true\n").unwrap();

    assert!(AppConfig::load_layered(&config_path).is_err());
}

#[test]
fn test_cli_overrides_verbose_levels() {
    let test_cases = vec![(0, "info"), (1, "debug"), (2, "trace"), (3, "trace")];

    for (verbose_level, expected_log_level) in test_cases {
        let mut config = AppConfig::default();
        let args = CliArgs {
            verbose: verbose_level,
            ..CliArgs::default()
        };

        config.apply_cli_overrides(&args);

        let logging = config.logging.as_ref().unwrap();
        assert_eq!(
            logging["default"].console_level, expected_log_level,
            "Failed for verbose level {verbose_level}"
        );
    }
}

#[test]
fn test_cli_auth_mode_override() {
    let mut config = AppConfig::default();
    config.apply_cli_overrides(&CliArgs {
        auth_mode: true,
        ..CliArgs::default()
    });
    assert!(config.startup.auth_mode_enabled);

    // absent flag never switches it back off
    config.apply_cli_overrides(&CliArgs::default());
    assert!(config.startup.auth_mode_enabled);
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DemoModuleConfig {
    #[serde(default)]
    retries: u32,
}

#[test]
fn test_module_config_typed_access() {
    let mut config = AppConfig::default();
    config
        .modules
        .insert("demo".to_string(), serde_json::json!({ "retries": 4 }));
    config
        .modules
        .insert("broken".to_string(), serde_json::json!({ "unknown": 1 }));
    let provider = AppConfigProvider::new(config);

    let demo: DemoModuleConfig = provider.module_config("demo").unwrap();
    assert_eq!(demo.retries, 4);

    let missing: DemoModuleConfig = provider.module_config("missing").unwrap();
    assert_eq!(missing.retries, 0);

    let err = provider.module_config::<DemoModuleConfig>("broken").unwrap_err();
    assert!(err.to_string().contains("broken"));
}
