use crate::contracts::UserInitState;
use crate::ensure::EnsureState;

/// Observable progress of a [`crate::StoreInitializer`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartupStatus {
    /// Number of times the reaction body was evaluated.
    pub reactions: u64,
    pub db_ready: bool,
    /// Count of observed not-ready → ready transitions.
    pub readiness_epoch: u64,
    pub effective_login: bool,
    /// Incremented for every feature dispatch.
    pub dispatch_generation: u64,
    /// Last generation the dispatch worker finished applying.
    pub applied_generation: u64,
    pub dispatched_login: Option<bool>,
    pub plugin_ensure: EnsureState,
    pub user_state: Option<UserInitState>,
}
