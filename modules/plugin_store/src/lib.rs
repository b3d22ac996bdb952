//! Plugin registry backends for the session startup.
//!
//! `memory` keeps installed plugins in-process and rejects duplicate
//! identifiers; `remote` talks to a plugin service over HTTP.

pub mod config;
pub mod error;
pub mod memory;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use initkit::PluginRegistry;
use tracing::info;

pub use config::{Backend, PluginStoreConfig};
pub use error::PluginStoreError;
pub use memory::InMemoryPluginRegistry;
pub use remote::RemotePluginRegistry;

/// Module name of the `modules.plugin_store` config section.
pub const MODULE_NAME: &str = "plugin_store";

/// Build the registry selected by `cfg.backend`.
pub fn build_registry(cfg: &PluginStoreConfig) -> Result<Arc<dyn PluginRegistry>, PluginStoreError> {
    match cfg.backend {
        Backend::Memory => {
            info!(
                preinstalled = cfg.preinstalled.len(),
                "Using in-memory plugin registry"
            );
            Ok(Arc::new(InMemoryPluginRegistry::with_installed(
                cfg.preinstalled.iter().cloned(),
            )))
        }
        Backend::Remote => {
            let base_url = cfg
                .base_url
                .as_deref()
                .ok_or(PluginStoreError::MissingBaseUrl)?;
            let registry =
                RemotePluginRegistry::new(base_url, Duration::from_secs(cfg.timeout_secs))?;
            info!(base_url = registry.base_url(), "Using remote plugin registry");
            Ok(Arc::new(registry))
        }
    }
}
