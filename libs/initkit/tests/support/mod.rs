//! Recording collaborators for driving the session startup end to end.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use initkit::{
    AgentConfig, AgentStore, AuthSnapshot, AuthState, ConfigSource, FeatureRegistry,
    InboxAgentFeature, InitSettings, InstalledPlugin, Navigator, PluginDescriptor, PluginRegistry,
    ProviderCredentialStore, ProviderCredentialsFeature, ServerConfig, StartupStatus,
    StoreHandles, StoreInitializer, SystemStatusState, UserInitState, ViewportSource,
};

pub const WAIT: Duration = Duration::from_secs(5);

/// Poll `cond` until it holds.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}

pub struct TestConfig {
    pub tx: watch::Sender<Arc<ServerConfig>>,
    /// Published by `fetch_server_config` when set.
    pub fetched: Mutex<Option<ServerConfig>>,
    pub fetches: Mutex<usize>,
}

impl TestConfig {
    pub fn publish(&self, cfg: ServerConfig) {
        self.tx.send_replace(Arc::new(cfg));
    }
}

#[async_trait]
impl ConfigSource for TestConfig {
    fn server_config(&self) -> watch::Receiver<Arc<ServerConfig>> {
        self.tx.subscribe()
    }

    async fn fetch_server_config(&self) -> anyhow::Result<()> {
        *self.fetches.lock() += 1;
        let next = self.fetched.lock().take();
        if let Some(cfg) = next {
            self.publish(cfg);
        }
        Ok(())
    }
}

pub struct TestAuth {
    pub tx: watch::Sender<AuthSnapshot>,
    pub is_onboard: Mutex<Option<bool>>,
    pub fail: Mutex<bool>,
    pub user_state_calls: Mutex<Vec<bool>>,
    pub oauth_pushes: Mutex<Vec<Vec<String>>>,
}

impl TestAuth {
    pub fn set(&self, is_login: bool, is_signed_in: bool) {
        self.tx.send_replace(AuthSnapshot {
            is_login,
            is_signed_in,
        });
    }
}

#[async_trait]
impl AuthState for TestAuth {
    fn auth(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    async fn initialize_user_state(
        &self,
        effective_login: bool,
        _server_config: &ServerConfig,
    ) -> anyhow::Result<UserInitState> {
        self.user_state_calls.lock().push(effective_login);
        if *self.fail.lock() {
            anyhow::bail!("user service unavailable");
        }
        Ok(UserInitState {
            is_onboard: *self.is_onboard.lock(),
            is_signed_in: effective_login,
        })
    }

    fn set_oauth_sso_providers(&self, providers: Vec<String>) {
        self.oauth_pushes.lock().push(providers);
    }
}

pub struct TestSystem {
    pub tx: watch::Sender<bool>,
    /// When set, `initialize_system_status` flips the ready flag itself.
    pub ready_on_init: bool,
    pub init_calls: Mutex<usize>,
    pub mobile_pushes: Mutex<Vec<bool>>,
    pub navigator_set: Mutex<bool>,
}

impl TestSystem {
    pub fn set_ready(&self) {
        self.tx.send_replace(true);
    }
}

#[async_trait]
impl SystemStatusState for TestSystem {
    fn db_ready(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    async fn initialize_system_status(&self) -> anyhow::Result<()> {
        *self.init_calls.lock() += 1;
        if self.ready_on_init {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.set_ready();
        }
        Ok(())
    }

    fn set_is_mobile(&self, is_mobile: bool) {
        self.mobile_pushes.lock().push(is_mobile);
    }

    fn set_navigator(&self, _navigator: Arc<dyn Navigator>) {
        *self.navigator_set.lock() = true;
    }
}

pub struct TestViewport {
    pub tx: watch::Sender<bool>,
}

impl ViewportSource for TestViewport {
    fn is_mobile(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[derive(Default)]
pub struct RecordingAgents {
    pub calls: Mutex<Vec<(bool, Option<AgentConfig>)>>,
}

#[async_trait]
impl AgentStore for RecordingAgents {
    async fn initialize_inbox_agent(
        &self,
        effective_login: bool,
        default_agent_config: Option<&AgentConfig>,
    ) -> anyhow::Result<()> {
        self.calls
            .lock()
            .push((effective_login, default_agent_config.cloned()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCredentials {
    pub calls: Mutex<Vec<bool>>,
}

#[async_trait]
impl ProviderCredentialStore for RecordingCredentials {
    async fn initialize_provider_credentials(&self, effective_login: bool) -> anyhow::Result<()> {
        self.calls.lock().push(effective_login);
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingRegistry {
    pub installed: Mutex<Vec<InstalledPlugin>>,
    pub created: Mutex<Vec<PluginDescriptor>>,
    pub list_calls: Mutex<usize>,
    pub fail_create: bool,
}

impl CountingRegistry {
    pub fn with_installed(identifier: &str) -> Self {
        let registry = Self::default();
        registry
            .installed
            .lock()
            .push(InstalledPlugin::new(identifier));
        registry
    }

    pub fn failing() -> Self {
        Self {
            fail_create: true,
            ..Default::default()
        }
    }

    pub fn count(&self, identifier: &str) -> usize {
        self.installed
            .lock()
            .iter()
            .filter(|p| p.identifier == identifier)
            .count()
    }
}

#[async_trait]
impl PluginRegistry for CountingRegistry {
    async fn list_installed(&self) -> anyhow::Result<Vec<InstalledPlugin>> {
        *self.list_calls.lock() += 1;
        Ok(self.installed.lock().clone())
    }

    async fn create(&self, descriptor: PluginDescriptor) -> anyhow::Result<()> {
        if self.fail_create {
            anyhow::bail!("plugin manifest rejected");
        }
        self.installed
            .lock()
            .push(InstalledPlugin::new(descriptor.identifier.clone()));
        self.created.lock().push(descriptor);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub paths: Mutex<Vec<String>>,
    pub fail: bool,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) -> anyhow::Result<()> {
        self.paths.lock().push(path.to_string());
        if self.fail {
            anyhow::bail!("router not mounted");
        }
        Ok(())
    }
}

/// Every collaborator of one session, kept concrete so tests can poke and inspect them.
pub struct Session {
    pub config: Arc<TestConfig>,
    pub auth: Arc<TestAuth>,
    pub system: Arc<TestSystem>,
    pub viewport: Arc<TestViewport>,
    pub agents: Arc<RecordingAgents>,
    pub credentials: Arc<RecordingCredentials>,
    pub plugins: Arc<CountingRegistry>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Session {
    pub fn new(db_ready: bool, plugins: CountingRegistry) -> Self {
        Self::build(db_ready, false, plugins, RecordingNavigator::default())
    }

    pub fn build(
        db_ready: bool,
        ready_on_init: bool,
        plugins: CountingRegistry,
        navigator: RecordingNavigator,
    ) -> Self {
        Self {
            config: Arc::new(TestConfig {
                tx: watch::channel(Arc::new(ServerConfig::default())).0,
                fetched: Mutex::new(None),
                fetches: Mutex::new(0),
            }),
            auth: Arc::new(TestAuth {
                tx: watch::channel(AuthSnapshot::default()).0,
                is_onboard: Mutex::new(None),
                fail: Mutex::new(false),
                user_state_calls: Mutex::new(Vec::new()),
                oauth_pushes: Mutex::new(Vec::new()),
            }),
            system: Arc::new(TestSystem {
                tx: watch::channel(db_ready).0,
                ready_on_init,
                init_calls: Mutex::new(0),
                mobile_pushes: Mutex::new(Vec::new()),
                navigator_set: Mutex::new(false),
            }),
            viewport: Arc::new(TestViewport {
                tx: watch::channel(false).0,
            }),
            agents: Arc::new(RecordingAgents::default()),
            credentials: Arc::new(RecordingCredentials::default()),
            plugins: Arc::new(plugins),
            navigator: Arc::new(navigator),
        }
    }

    pub fn handles(&self) -> StoreHandles {
        StoreHandles {
            config: self.config.clone(),
            auth: self.auth.clone(),
            system: self.system.clone(),
            plugins: self.plugins.clone(),
            navigator: self.navigator.clone(),
            viewport: self.viewport.clone(),
        }
    }

    pub fn features(&self) -> FeatureRegistry {
        let mut b = FeatureRegistry::builder();
        b.register("inbox_agent", &[], Arc::new(InboxAgentFeature(self.agents.clone())))
            .register(
                "provider_credentials",
                &[],
                Arc::new(ProviderCredentialsFeature(self.credentials.clone())),
            );
        b.build().expect("feature registry")
    }

    pub fn initializer(&self, settings: InitSettings, cancel: CancellationToken) -> StoreInitializer {
        StoreInitializer::new(self.handles(), self.features(), settings, cancel)
    }

    /// Start the initializer on its own task.
    pub fn start(&self, settings: InitSettings) -> Running {
        let cancel = CancellationToken::new();
        Running::spawn(self.initializer(settings, cancel.clone()), cancel)
    }
}

pub struct Running {
    pub status: watch::Receiver<StartupStatus>,
    cancel: CancellationToken,
    handle: JoinHandle<StartupStatus>,
}

impl Running {
    /// `cancel` must be the token the initializer was built with.
    pub fn spawn(initializer: StoreInitializer, cancel: CancellationToken) -> Self {
        let status = initializer.subscribe();
        let handle = tokio::spawn(initializer.run());
        Self {
            status,
            cancel,
            handle,
        }
    }

    /// Wait until the latest status satisfies `pred`.
    pub async fn until(&mut self, mut pred: impl FnMut(&StartupStatus) -> bool) -> StartupStatus {
        tokio::time::timeout(WAIT, self.status.wait_for(|s| pred(s)))
            .await
            .expect("timed out waiting for startup status")
            .expect("initializer dropped its status")
            .clone()
    }

    /// Apply an input change and wait for the reaction it triggers.
    pub async fn react_to(&mut self, change: impl FnOnce()) -> StartupStatus {
        let seen = self.status.borrow().reactions;
        change();
        self.until(|s| s.reactions > seen).await
    }

    pub fn current(&self) -> StartupStatus {
        self.status.borrow().clone()
    }

    /// Stop reacting, wait for in-flight initializers, return the final status.
    pub async fn stop(self) -> StartupStatus {
        self.cancel.cancel();
        tokio::time::timeout(WAIT, self.handle)
            .await
            .expect("initializer did not stop")
            .expect("initializer task panicked")
    }
}
