use parking_lot::RwLock;
use tracing::info;

use initkit::Navigator;

/// Records the current route and logs every navigation.
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    current: RwLock<Option<String>>,
}

impl LoggingNavigator {
    pub fn current(&self) -> Option<String> {
        self.current.read().clone()
    }
}

impl Navigator for LoggingNavigator {
    fn navigate(&self, path: &str) -> anyhow::Result<()> {
        info!(path, "Navigating");
        *self.current.write() = Some(path.to_string());
        Ok(())
    }
}
