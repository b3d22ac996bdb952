use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use initkit_bootstrap::{AppConfig, AppConfigProvider, CliArgs, ConfigProviderExt};
use mimalloc::MiMalloc;

use std::path::{Path, PathBuf};

use initkit::runtime::{run, RunOptions, ShutdownOptions};
use initkit::InitSettings;
use plugin_store::PluginStoreConfig;
use session_stores::SessionStores;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// InitKit Host - runs one session's store initialization
#[derive(Parser)]
#[command(name = "initkit-host")]
#[command(about = "InitKit Host - session store initialization")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Treat raw sign-in as the login signal (overrides config)
    #[arg(long)]
    auth_mode: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session startup until Ctrl+C / SIGTERM
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        verbose: cli.verbose,
        auth_mode: cli.auth_mode,
    };

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    initkit_bootstrap::logging::init_logging_unified(&logging_config, Path::new("."));

    tracing::info!("InitKit Host starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_session(config).await,
        Commands::Check => check_config(config),
    }
}

async fn run_session(config: AppConfig) -> Result<()> {
    let settings = InitSettings::from_config(&config);
    let auth_mode_enabled = config.startup.auth_mode_enabled;
    let provider = AppConfigProvider::new(config);

    let stores = SessionStores::from_provider(&provider, auth_mode_enabled)
        .context("session_stores config")?;
    let plugin_cfg: PluginStoreConfig = provider
        .module_config(plugin_store::MODULE_NAME)
        .context("plugin_store config")?;
    let plugins = plugin_store::build_registry(&plugin_cfg).context("plugin registry")?;

    tracing::info!(
        auth_mode_enabled,
        default_plugin = settings.default_plugin.as_ref().map(|d| d.identifier.as_str()),
        "Initializing session stores…"
    );

    let status = run(RunOptions {
        handles: stores.handles(plugins),
        features: stores.feature_registry()?,
        settings,
        shutdown: ShutdownOptions::Signals,
    })
    .await?;

    tracing::info!(
        db_ready = status.db_ready,
        effective_login = status.effective_login,
        route = ?stores.navigator.current(),
        inbox_model = ?stores.agents.inbox().and_then(|a| a.config.get("model").cloned()),
        "Session state at shutdown"
    );
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration…");
    let provider = AppConfigProvider::new(config);

    let stores_cfg: session_stores::SessionStoresConfig =
        provider.module_config(session_stores::MODULE_NAME)?;
    let plugin_cfg: PluginStoreConfig = provider.module_config(plugin_store::MODULE_NAME)?;
    plugin_store::build_registry(&plugin_cfg)?;

    println!("Configuration is valid");
    println!(
        "session_stores: db_init_delay_ms={}, oauth providers={:?}",
        stores_cfg.db_init_delay_ms, stores_cfg.server.oauth_sso_providers
    );
    println!("plugin_store: backend={:?}", plugin_cfg.backend);
    println!("{}", provider.inner().to_yaml()?);
    Ok(())
}
