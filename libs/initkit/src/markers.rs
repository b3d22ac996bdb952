use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Effect name of the default plugin ensure.
pub const DEFAULT_PLUGIN_EFFECT: &str = "default_plugin_ensure";
/// Effect name of the onboarding redirect.
pub const ONBOARDING_REDIRECT_EFFECT: &str = "onboarding_redirect";

/// "Already ran" markers for one-time effects, scoped to readiness epochs.
///
/// An epoch is counted by the initializer each time it observes the local
/// store becoming ready. A marker can be claimed once per epoch, regardless of
/// how many times the reaction body is re-evaluated.
#[derive(Debug, Default)]
pub struct InitMarkers {
    fired: DashMap<&'static str, u64>,
}

impl InitMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once per `(effect, epoch)`; older epochs never
    /// claim again once a newer one fired.
    pub fn claim(&self, effect: &'static str, epoch: u64) -> bool {
        match self.fired.entry(effect) {
            Entry::Occupied(mut e) => {
                if *e.get() >= epoch {
                    return false;
                }
                e.insert(epoch);
                true
            }
            Entry::Vacant(e) => {
                e.insert(epoch);
                true
            }
        }
    }

    pub fn last_epoch(&self, effect: &str) -> Option<u64> {
        self.fired.get(effect).map(|e| *e.value())
    }
}
