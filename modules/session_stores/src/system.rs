use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use initkit::{Navigator, SystemStatusState};

/// Local database readiness plus the viewport and navigation slots.
pub struct SystemStatusStore {
    db_ready: watch::Sender<bool>,
    init_delay: Duration,
    is_mobile: RwLock<Option<bool>>,
    navigator: RwLock<Option<Arc<dyn Navigator>>>,
}

impl SystemStatusStore {
    pub fn new(init_delay: Duration) -> Self {
        let (db_ready, _) = watch::channel(false);
        Self {
            db_ready,
            init_delay,
            is_mobile: RwLock::new(None),
            navigator: RwLock::new(None),
        }
    }

    pub fn is_db_ready(&self) -> bool {
        *self.db_ready.borrow()
    }

    /// Flip the ready flag. It never goes back to false.
    pub fn mark_ready(&self) {
        if !self.db_ready.send_replace(true) {
            info!("Local database ready");
        }
    }

    pub fn is_mobile(&self) -> Option<bool> {
        *self.is_mobile.read()
    }

    /// Navigate through the handle pushed by the initializer.
    pub fn navigate(&self, path: &str) -> anyhow::Result<()> {
        let navigator = self
            .navigator
            .read()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("navigator not set"))?;
        navigator.navigate(path)
    }
}

#[async_trait]
impl SystemStatusState for SystemStatusStore {
    fn db_ready(&self) -> watch::Receiver<bool> {
        self.db_ready.subscribe()
    }

    #[instrument(name = "session_stores.system.initialize", skip(self))]
    async fn initialize_system_status(&self) -> anyhow::Result<()> {
        if self.is_db_ready() {
            debug!("Local database already initialized");
            return Ok(());
        }
        if !self.init_delay.is_zero() {
            tokio::time::sleep(self.init_delay).await;
        }
        self.mark_ready();
        Ok(())
    }

    fn set_is_mobile(&self, is_mobile: bool) {
        debug!(is_mobile, "Viewport classification updated");
        *self.is_mobile.write() = Some(is_mobile);
    }

    fn set_navigator(&self, navigator: Arc<dyn Navigator>) {
        *self.navigator.write() = Some(navigator);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LoggingNavigator;

    #[tokio::test]
    async fn initialize_marks_ready_once() {
        let store = SystemStatusStore::new(Duration::from_millis(5));
        let mut rx = store.db_ready();
        assert!(!*rx.borrow());

        store.initialize_system_status().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        store.initialize_system_status().await.unwrap();
        store.mark_ready();
        assert!(store.is_db_ready());
    }

    #[test]
    fn navigation_requires_a_navigator() {
        let store = SystemStatusStore::new(Duration::ZERO);
        assert!(store.navigate("/onboard").is_err());

        let navigator = Arc::new(LoggingNavigator::default());
        store.set_navigator(navigator.clone());
        store.navigate("/onboard").unwrap();
        assert_eq!(navigator.current().as_deref(), Some("/onboard"));
    }

    #[test]
    fn keeps_viewport_classification() {
        let store = SystemStatusStore::new(Duration::ZERO);
        assert_eq!(store.is_mobile(), None);
        store.set_is_mobile(true);
        assert_eq!(store.is_mobile(), Some(true));
    }
}
