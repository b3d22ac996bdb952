use std::fmt::Debug;

/// Pushes a locally observed value into a store, but only when it changed
/// since the last push.
pub struct StoreUpdater<T> {
    key: &'static str,
    last: Option<T>,
    apply: Box<dyn Fn(T) + Send + Sync>,
}

impl<T> StoreUpdater<T>
where
    T: Clone + PartialEq + Debug,
{
    pub fn new(key: &'static str, apply: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            key,
            last: None,
            apply: Box::new(apply),
        }
    }

    /// Returns whether the value was pushed.
    pub fn update(&mut self, value: T) -> bool {
        if self.last.as_ref() == Some(&value) {
            return false;
        }
        tracing::trace!(key = self.key, value = ?value, "store updater push");
        (self.apply)(value.clone());
        self.last = Some(value);
        true
    }

    pub fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }
}
