//! Observable cells
//!
//! A [`Cell`] holds one value and publishes every change to its subscribers
//! over a `tokio::sync::watch` channel. Nothing here knows about a view
//! layer; a subscriber is any task awaiting `changed()`.

use tokio::sync::watch;

/// A value cell with explicit publish-on-change
#[derive(Debug)]
pub struct Cell<T> {
    tx: watch::Sender<T>,
}

impl<T> Cell<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx }
    }

    /// Run `f` against the current value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Store `value` and notify subscribers, even if it equals the current value
    pub fn replace(&self, value: T) -> T {
        self.tx.send_replace(value)
    }

    /// Receiver that observes every subsequent publish
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> Cell<T> {
    /// Current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: PartialEq> Cell<T> {
    /// Store `value`, notifying subscribers only if it differs from the current one
    ///
    /// Returns whether a change was published.
    pub fn set(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

impl<T: Default> Default for Cell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_set() {
        let cell = Cell::new(false);
        assert!(!cell.get());

        assert!(cell.set(true));
        assert!(cell.get());

        // Same value is not republished
        assert!(!cell.set(true));
    }

    #[test]
    fn test_with_borrows() {
        let cell = Cell::new(vec![1, 2, 3]);
        assert_eq!(cell.with(|v| v.len()), 3);
    }

    #[tokio::test]
    async fn test_subscriber_sees_change() {
        let cell = Cell::new(None::<String>);
        let mut rx = cell.subscribe();
        assert_eq!(cell.subscriber_count(), 1);

        cell.set(Some("boom".to_string()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_unchanged_set_does_not_wake() {
        let cell = Cell::new(1u32);
        let mut rx = cell.subscribe();

        cell.set(1);
        assert!(!rx.has_changed().unwrap());

        cell.replace(1);
        assert!(rx.has_changed().unwrap());
    }
}
