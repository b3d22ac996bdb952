//! One-time default plugin ensure.
//!
//! State machine: `NotStarted → Running → Done | Failed`. `Failed` is
//! terminal for the epoch: the error is logged and nothing is retried.

use anyhow::Context;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::contracts::PluginRegistry;
use crate::plugin::PluginDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The reserved identifier was already installed; nothing was created.
    AlreadyInstalled,
    Created,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnsureState {
    #[default]
    NotStarted,
    Running,
    Done(EnsureOutcome),
    Failed(String),
}

impl EnsureState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnsureState::Done(_) | EnsureState::Failed(_))
    }
}

pub struct DefaultPluginEnsure {
    descriptor: PluginDescriptor,
    state: Mutex<EnsureState>,
}

impl std::fmt::Debug for DefaultPluginEnsure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultPluginEnsure")
            .field("identifier", &self.descriptor.identifier)
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl DefaultPluginEnsure {
    pub fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            descriptor,
            state: Mutex::new(EnsureState::NotStarted),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.descriptor.identifier
    }

    pub fn state(&self) -> EnsureState {
        self.state.lock().clone()
    }

    /// List installed plugins, create the descriptor if its identifier is
    /// missing. Never fails: errors end in [`EnsureState::Failed`].
    ///
    /// List and create are two calls; a concurrent session can interleave
    /// between them and the registry's own uniqueness check is the only
    /// backstop.
    #[instrument(name = "initkit.default_plugin.ensure", skip_all, fields(identifier = %self.descriptor.identifier))]
    pub async fn run(&self, registry: &dyn PluginRegistry) -> EnsureState {
        *self.state.lock() = EnsureState::Running;

        let next = match self.list_then_create(registry).await {
            Ok(outcome) => EnsureState::Done(outcome),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "Failed to initialize default plugin");
                EnsureState::Failed(format!("{e:#}"))
            }
        };

        *self.state.lock() = next.clone();
        next
    }

    async fn list_then_create(
        &self,
        registry: &dyn PluginRegistry,
    ) -> anyhow::Result<EnsureOutcome> {
        let installed = registry
            .list_installed()
            .await
            .context("listing installed plugins")?;

        if installed
            .iter()
            .any(|p| p.identifier == self.descriptor.identifier)
        {
            debug!("Default plugin already installed");
            return Ok(EnsureOutcome::AlreadyInstalled);
        }

        registry
            .create(self.descriptor.clone())
            .await
            .context("creating default plugin")?;
        info!("Default plugin installed");
        Ok(EnsureOutcome::Created)
    }
}
