use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use initkit::{AuthSnapshot, AuthState, ServerConfig, UserInitState};

/// Session-scoped auth store.
///
/// Without auth mode every session counts as logged in; with it, `is_login`
/// follows the raw sign-in flag.
pub struct SessionAuthStore {
    auth_mode_enabled: bool,
    tx: watch::Sender<AuthSnapshot>,
    onboarded: RwLock<bool>,
    oauth_sso_providers: RwLock<Vec<String>>,
    user: Mutex<Option<(bool, UserInitState)>>,
    user_loads: Mutex<usize>,
}

impl SessionAuthStore {
    pub fn new(auth_mode_enabled: bool, signed_in: bool, onboarded: bool) -> Self {
        let (tx, _) = watch::channel(snapshot(auth_mode_enabled, signed_in));
        Self {
            auth_mode_enabled,
            tx,
            onboarded: RwLock::new(onboarded),
            oauth_sso_providers: RwLock::new(Vec::new()),
            user: Mutex::new(None),
            user_loads: Mutex::new(0),
        }
    }

    pub fn sign_in(&self) {
        self.set_signed_in(true);
    }

    pub fn sign_out(&self) {
        self.set_signed_in(false);
    }

    fn set_signed_in(&self, signed_in: bool) {
        let next = snapshot(self.auth_mode_enabled, signed_in);
        self.tx.send_if_modified(|cur| {
            if *cur == next {
                return false;
            }
            *cur = next;
            true
        });
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        *self.tx.borrow()
    }

    pub fn complete_onboarding(&self) {
        *self.onboarded.write() = true;
    }

    pub fn oauth_sso_providers(&self) -> Vec<String> {
        self.oauth_sso_providers.read().clone()
    }

    pub fn user_state(&self) -> Option<UserInitState> {
        self.user.lock().as_ref().map(|(_, state)| state.clone())
    }

    /// Number of times the user state was actually (re)loaded.
    pub fn user_loads(&self) -> usize {
        *self.user_loads.lock()
    }
}

fn snapshot(auth_mode_enabled: bool, signed_in: bool) -> AuthSnapshot {
    AuthSnapshot {
        is_login: !auth_mode_enabled || signed_in,
        is_signed_in: signed_in,
    }
}

#[async_trait]
impl AuthState for SessionAuthStore {
    fn auth(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    #[instrument(name = "session_stores.auth.initialize_user_state", skip(self, _server_config))]
    async fn initialize_user_state(
        &self,
        effective_login: bool,
        _server_config: &ServerConfig,
    ) -> anyhow::Result<UserInitState> {
        let mut user = self.user.lock();
        if let Some((login, state)) = user.as_ref() {
            if *login == effective_login {
                debug!("User state already initialized");
                return Ok(state.clone());
            }
        }

        let state = UserInitState {
            is_onboard: Some(*self.onboarded.read()),
            is_signed_in: effective_login,
        };
        *self.user_loads.lock() += 1;
        info!(is_onboard = ?state.is_onboard, "User state initialized");
        *user = Some((effective_login, state.clone()));
        Ok(state)
    }

    fn set_oauth_sso_providers(&self, providers: Vec<String>) {
        debug!(?providers, "OAuth SSO providers updated");
        *self.oauth_sso_providers.write() = providers;
    }
}
