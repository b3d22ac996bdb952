use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use initkit::{InstalledPlugin, PluginDescriptor, PluginRegistry};

use crate::error::PluginStoreError;

/// Process-local registry. Identifiers are unique: a second `create` for an
/// installed identifier fails with [`PluginStoreError::Duplicate`].
#[derive(Debug, Default)]
pub struct InMemoryPluginRegistry {
    installed: RwLock<Vec<InstalledPlugin>>,
}

impl InMemoryPluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_installed<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            installed: RwLock::new(identifiers.into_iter().map(InstalledPlugin::new).collect()),
        }
    }

    pub fn installed(&self) -> Vec<InstalledPlugin> {
        self.installed.read().clone()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.installed
            .read()
            .iter()
            .any(|p| p.identifier == identifier)
    }

    /// Insert unless the identifier is taken. Check and insert happen under
    /// one write lock.
    pub fn insert(&self, descriptor: PluginDescriptor) -> Result<(), PluginStoreError> {
        let mut installed = self.installed.write();
        if installed.iter().any(|p| p.identifier == descriptor.identifier) {
            return Err(PluginStoreError::Duplicate {
                identifier: descriptor.identifier,
            });
        }

        let mut entry = InstalledPlugin::new(descriptor.identifier.clone());
        if let Ok(serde_json::Value::Object(fields)) = serde_json::to_value(&descriptor) {
            entry.extra = fields;
            entry.extra.remove("identifier");
        }
        installed.push(entry);
        Ok(())
    }
}

#[async_trait]
impl PluginRegistry for InMemoryPluginRegistry {
    async fn list_installed(&self) -> anyhow::Result<Vec<InstalledPlugin>> {
        Ok(self.installed())
    }

    #[instrument(name = "plugin_store.memory.create", skip_all, fields(identifier = %descriptor.identifier))]
    async fn create(&self, descriptor: PluginDescriptor) -> anyhow::Result<()> {
        self.insert(descriptor)?;
        debug!("Plugin stored");
        Ok(())
    }
}
