//! Store Initializer - drives one session's startup sequence
//!
//! Mount spawns the system status and server config loads, then the reaction
//! body runs once and again on every change of a watched input:
//! store updaters → readiness epoch → default plugin ensure → effective login → dispatch.
//!
//! Dispatches are applied in generation order by a single worker, so an
//! older generation never lands after a newer one.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn, Instrument};

use initkit_bootstrap::AppConfig;

use crate::contracts::{
    AuthSnapshot, AuthState, ConfigSource, FeatureInputs, Navigator, PluginRegistry,
    ServerConfig, SystemStatusState, ViewportSource,
};
use crate::ensure::{DefaultPluginEnsure, EnsureState};
use crate::login::{effective_login, LoginInputs};
use crate::markers::{InitMarkers, DEFAULT_PLUGIN_EFFECT, ONBOARDING_REDIRECT_EFFECT};
use crate::plugin::{default_plugin_descriptor, PluginDescriptor};
use crate::registry::{FeatureEntry, FeatureRegistry};
use crate::runtime::StartupStatus;
use crate::updater::StoreUpdater;

/// Injected handles to every store the initializer reads or feeds.
#[derive(Clone)]
pub struct StoreHandles {
    pub config: Arc<dyn ConfigSource>,
    pub auth: Arc<dyn AuthState>,
    pub system: Arc<dyn SystemStatusState>,
    pub plugins: Arc<dyn PluginRegistry>,
    pub navigator: Arc<dyn Navigator>,
    pub viewport: Arc<dyn ViewportSource>,
}

#[derive(Debug, Clone)]
pub struct InitSettings {
    pub auth_mode_enabled: bool,
    pub onboarding_path: String,
    /// `None` disables the default plugin ensure.
    pub default_plugin: Option<PluginDescriptor>,
}

impl InitSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            auth_mode_enabled: cfg.startup.auth_mode_enabled,
            onboarding_path: cfg.startup.onboarding_path.clone(),
            default_plugin: cfg
                .default_plugin
                .enabled
                .then(|| default_plugin_descriptor(&cfg.default_plugin)),
        }
    }
}

impl Default for InitSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Receivers the reaction reads from; their change streams trigger it.
struct Watched {
    db_ready: watch::Receiver<bool>,
    auth: watch::Receiver<AuthSnapshot>,
    server_config: watch::Receiver<Arc<ServerConfig>>,
    is_mobile: watch::Receiver<bool>,
}

impl Watched {
    fn subscribe(handles: &StoreHandles) -> Self {
        Self {
            db_ready: handles.system.db_ready(),
            auth: handles.auth.auth(),
            server_config: handles.config.server_config(),
            is_mobile: handles.viewport.is_mobile(),
        }
    }

    /// Ends only when every watched sender is gone.
    fn changes(&self) -> BoxStream<'static, ()> {
        stream::select_all([
            WatchStream::from_changes(self.db_ready.clone())
                .map(|_| ())
                .boxed(),
            WatchStream::from_changes(self.auth.clone())
                .map(|_| ())
                .boxed(),
            WatchStream::from_changes(self.server_config.clone())
                .map(|_| ())
                .boxed(),
            WatchStream::from_changes(self.is_mobile.clone())
                .map(|_| ())
                .boxed(),
        ])
        .boxed()
    }
}

/// One queued feature dispatch.
struct Dispatch {
    generation: u64,
    epoch: u64,
    inputs: FeatureInputs,
}

/// What the reaction remembers between evaluations.
struct Reaction {
    db_ready: bool,
    epoch: u64,
    generation: u64,
    dispatched: Option<FeatureInputs>,
    dispatches: mpsc::UnboundedSender<Dispatch>,
    oauth_providers: StoreUpdater<Vec<String>>,
    is_mobile: StoreUpdater<bool>,
}

impl Reaction {
    fn new(handles: &StoreHandles, dispatches: mpsc::UnboundedSender<Dispatch>) -> Self {
        let auth = handles.auth.clone();
        let system = handles.system.clone();
        Self {
            db_ready: false,
            epoch: 0,
            generation: 0,
            dispatched: None,
            dispatches,
            oauth_providers: StoreUpdater::new("oAuthSSOProviders", move |providers: Vec<String>| {
                auth.set_oauth_sso_providers(providers)
            }),
            is_mobile: StoreUpdater::new("isMobile", move |mobile: bool| {
                system.set_is_mobile(mobile)
            }),
        }
    }
}

pub struct StoreInitializer {
    handles: StoreHandles,
    features: Arc<FeatureRegistry>,
    settings: Arc<InitSettings>,
    plugin_ensure: Option<Arc<DefaultPluginEnsure>>,
    markers: Arc<InitMarkers>,
    tasks: TaskTracker,
    cancel: CancellationToken,
    status: Arc<watch::Sender<StartupStatus>>,
}

impl StoreInitializer {
    /// Prepare the initializer; nothing runs until [`StoreInitializer::run`].
    pub fn new(
        handles: StoreHandles,
        features: FeatureRegistry,
        settings: InitSettings,
        cancel: CancellationToken,
    ) -> Self {
        let plugin_ensure = settings
            .default_plugin
            .clone()
            .map(|d| Arc::new(DefaultPluginEnsure::new(d)));
        let (status, _) = watch::channel(StartupStatus::default());

        Self {
            handles,
            features: Arc::new(features),
            settings: Arc::new(settings),
            plugin_ensure,
            markers: Arc::new(InitMarkers::new()),
            tasks: TaskTracker::new(),
            cancel,
            status: Arc::new(status),
        }
    }

    /// Share one-time effect markers with other initializers of the process.
    pub fn with_markers(mut self, markers: Arc<InitMarkers>) -> Self {
        self.markers = markers;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<StartupStatus> {
        self.status.subscribe()
    }

    /// React to input changes until cancelled, then wait for in-flight
    /// initializers and return the final status.
    pub async fn run(self) -> StartupStatus {
        info!(
            features = ?self.features.names(),
            auth_mode_enabled = self.settings.auth_mode_enabled,
            "Session startup: mount"
        );

        let watched = Watched::subscribe(&self.handles);
        let mut changes = watched.changes();
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        let mut reaction = Reaction::new(&self.handles, dispatch_tx);

        self.tasks.spawn(self.dispatcher().run(dispatch_rx));
        self.mount();
        self.react(&watched, &mut reaction);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                change = changes.next() => match change {
                    Some(()) => self.react(&watched, &mut reaction),
                    None => {
                        debug!("All watched inputs closed; waiting for shutdown");
                        self.cancel.cancelled().await;
                        break;
                    }
                },
            }
        }

        info!("Session startup: stopping, waiting for in-flight initializers");
        // Closing the queue lets the dispatch worker drain and exit.
        drop(reaction);
        self.tasks.close();
        self.tasks.wait().await;

        let status = self.status.borrow().clone();
        status
    }

    fn mount(&self) {
        self.handles
            .system
            .set_navigator(Arc::clone(&self.handles.navigator));

        let system = Arc::clone(&self.handles.system);
        self.tasks.spawn(async move {
            if let Err(e) = system.initialize_system_status().await {
                warn!(error = %e, "System status initialization failed");
            }
        });

        let config = Arc::clone(&self.handles.config);
        self.tasks.spawn(async move {
            if let Err(e) = config.fetch_server_config().await {
                warn!(error = %e, "Server config fetch failed");
            }
        });
    }

    fn react(&self, watched: &Watched, r: &mut Reaction) {
        let db_ready = *watched.db_ready.borrow();
        let auth = *watched.auth.borrow();
        let server_config = watched.server_config.borrow().clone();
        let is_mobile = *watched.is_mobile.borrow();

        r.oauth_providers
            .update(server_config.oauth_sso_providers.clone());
        r.is_mobile.update(is_mobile);

        if db_ready && !r.db_ready {
            r.epoch += 1;
            info!(epoch = r.epoch, "Local store ready");
        }
        r.db_ready = db_ready;

        if db_ready {
            self.ensure_default_plugin(r.epoch);
        }

        let login = effective_login(LoginInputs {
            db_ready,
            auth_mode_enabled: self.settings.auth_mode_enabled,
            is_signed_in: auth.is_signed_in,
            is_login: auth.is_login,
        });

        // Before the local store is ready auth values race provider
        // resolution, so nothing is dispatched.
        if db_ready {
            let inputs = FeatureInputs {
                effective_login: login,
                server_config,
            };
            if r.dispatched.as_ref() != Some(&inputs) {
                r.generation += 1;
                debug!(
                    generation = r.generation,
                    effective_login = login,
                    "Queueing feature dispatch"
                );
                let queued = r.dispatches.send(Dispatch {
                    generation: r.generation,
                    epoch: r.epoch,
                    inputs: inputs.clone(),
                });
                if queued.is_err() {
                    warn!(generation = r.generation, "Dispatch worker is gone");
                }
                r.dispatched = Some(inputs);
            }
        }

        self.status.send_modify(|s| {
            s.reactions += 1;
            s.db_ready = db_ready;
            s.readiness_epoch = r.epoch;
            s.effective_login = login;
            s.dispatch_generation = r.generation;
            s.dispatched_login = r.dispatched.as_ref().map(|i| i.effective_login);
        });
    }

    fn ensure_default_plugin(&self, epoch: u64) {
        let Some(ensure) = &self.plugin_ensure else {
            return;
        };
        if !self.markers.claim(DEFAULT_PLUGIN_EFFECT, epoch) {
            return;
        }

        self.status
            .send_modify(|s| s.plugin_ensure = EnsureState::Running);

        let ensure = Arc::clone(ensure);
        let registry = Arc::clone(&self.handles.plugins);
        let status = Arc::clone(&self.status);
        self.tasks.spawn(async move {
            let state = ensure.run(registry.as_ref()).await;
            status.send_modify(|s| s.plugin_ensure = state);
        });
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            features: Arc::clone(&self.features),
            auth: Arc::clone(&self.handles.auth),
            navigator: Arc::clone(&self.handles.navigator),
            markers: Arc::clone(&self.markers),
            settings: Arc::clone(&self.settings),
            status: Arc::clone(&self.status),
            applied: HashMap::new(),
            user_login: None,
        }
    }
}

/// Key a feature store was last run with: effective login plus its config slice.
type FeatureKey = (bool, serde_json::Value);

/// Applies queued dispatches one at a time and skips stores whose own inputs
/// did not change since their last run.
struct Dispatcher {
    features: Arc<FeatureRegistry>,
    auth: Arc<dyn AuthState>,
    navigator: Arc<dyn Navigator>,
    markers: Arc<InitMarkers>,
    settings: Arc<InitSettings>,
    status: Arc<watch::Sender<StartupStatus>>,
    applied: HashMap<&'static str, FeatureKey>,
    user_login: Option<bool>,
}

impl Dispatcher {
    async fn run(mut self, mut queue: mpsc::UnboundedReceiver<Dispatch>) {
        while let Some(dispatch) = queue.recv().await {
            let generation = dispatch.generation;
            self.apply(dispatch)
                .instrument(tracing::info_span!("initkit.dispatch", generation))
                .await;
            self.status
                .send_modify(|s| s.applied_generation = generation);
        }
        debug!("Dispatch queue closed");
    }

    async fn apply(&mut self, dispatch: Dispatch) {
        let Dispatch { epoch, inputs, .. } = dispatch;

        let mut due: Vec<Vec<&FeatureEntry>> = Vec::new();
        for level in self.features.levels() {
            let mut stores = Vec::new();
            for entry in level {
                let key = (
                    inputs.effective_login,
                    entry.store.config_slice(&inputs.server_config),
                );
                if self.applied.get(entry.name) == Some(&key) {
                    debug!(store = entry.name, "Inputs unchanged, skipping");
                    continue;
                }
                self.applied.insert(entry.name, key);
                stores.push(entry);
            }
            due.push(stores);
        }

        let user_due = self.user_login != Some(inputs.effective_login);
        self.user_login = Some(inputs.effective_login);

        let this = &*self;
        let user_state = async {
            if user_due {
                this.initialize_user_state(epoch, &inputs).await;
            }
        };
        future::join(initialize_features(&due, &inputs), user_state).await;
    }

    async fn initialize_user_state(&self, epoch: u64, inputs: &FeatureInputs) {
        let state = match self
            .auth
            .initialize_user_state(inputs.effective_login, &inputs.server_config)
            .await
        {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "User state initialization failed");
                return;
            }
        };

        if state.is_onboard == Some(false) && self.markers.claim(ONBOARDING_REDIRECT_EFFECT, epoch)
        {
            let path = self.settings.onboarding_path.as_str();
            info!(path, "User not onboarded, redirecting");
            if let Err(e) = self.navigator.navigate(path) {
                warn!(error = %e, path, "Onboarding redirect failed");
            }
        }

        self.status.send_modify(|s| s.user_state = Some(state));
    }
}

/// Run feature stores level by level; stores within a level run concurrently.
/// A failing store is logged and does not hold back later levels.
async fn initialize_features(levels: &[Vec<&FeatureEntry>], inputs: &FeatureInputs) {
    for (depth, level) in levels.iter().enumerate() {
        let results = future::join_all(
            level
                .iter()
                .map(|entry| async move { (entry.name, entry.store.initialize(inputs).await) }),
        )
        .await;

        for (store, result) in results {
            match result {
                Ok(()) => debug!(store, depth, "Feature store initialized"),
                Err(e) => warn!(store, depth, error = %e, "Feature store initialization failed"),
            }
        }
    }
}
