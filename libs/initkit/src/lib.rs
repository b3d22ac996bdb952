//! # InitKit - Session Store Initialization
//!
//! Brings independently-owned client stores (server config, auth, system
//! status, per-feature stores) into a consistent initial state for one session.
//!
//! ## Features
//!
//! - **Reactive**: the initializer re-evaluates whenever a watched input changes
//! - **Gated**: nothing is fed to feature stores before the local store is ready
//! - **Convergent**: unchanged inputs never cause a second dispatch
//! - **One-shot effects**: the default plugin is ensured once per readiness epoch
//! - **Dependency-ordered**: feature stores declare deps and run level by level
//!
//! ## Example
//!
//! ```rust,ignore
//! use initkit::{FeatureRegistry, InboxAgentFeature, InitSettings, StoreHandles};
//! use initkit::runtime::{run, RunOptions, ShutdownOptions};
//!
//! let mut features = FeatureRegistry::builder();
//! features.register("inbox_agent", &[], Arc::new(InboxAgentFeature(agent_store)));
//!
//! let status = run(RunOptions {
//!     handles,
//!     features: features.build()?,
//!     settings: InitSettings::from_config(&app_config),
//!     shutdown: ShutdownOptions::Signals,
//! })
//! .await?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod contracts;
pub mod ensure;
pub mod login;
pub mod markers;
pub mod plugin;
pub mod registry;
pub mod runtime;
pub mod updater;

pub use contracts::*;
pub use ensure::{DefaultPluginEnsure, EnsureOutcome, EnsureState};
pub use login::{effective_login, LoginInputs};
pub use markers::InitMarkers;
pub use plugin::{default_plugin_descriptor, InstalledPlugin, PluginDescriptor};
pub use registry::{FeatureEntry, FeatureRegistry, FeatureRegistryBuilder, RegistryError};
pub use runtime::{InitSettings, StartupStatus, StoreHandles, StoreInitializer};
pub use updater::StoreUpdater;
