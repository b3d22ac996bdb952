use tokio::sync::watch;

use initkit::ViewportSource;

/// Viewport classification set by the host.
pub struct StaticViewport {
    tx: watch::Sender<bool>,
}

impl StaticViewport {
    pub fn new(is_mobile: bool) -> Self {
        let (tx, _) = watch::channel(is_mobile);
        Self { tx }
    }

    pub fn set_mobile(&self, is_mobile: bool) {
        self.tx.send_if_modified(|cur| {
            let changed = *cur != is_mobile;
            *cur = is_mobile;
            changed
        });
    }
}

impl ViewportSource for StaticViewport {
    fn is_mobile(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
