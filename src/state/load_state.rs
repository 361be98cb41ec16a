//! Load State triple
//!
//! `loading`, `result` and `error` cells owned by one resource client.
//! Only the load orchestrator mutates them, through the transition methods
//! below; presentation code reads or subscribes.

use std::sync::Arc;

use super::cell::Cell;

/// Shared payload of a successful load
pub type Payload<R> = Arc<Vec<R>>;

/// Phase derived from the three cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing loaded yet
    Idle,
    /// A request is outstanding
    Loading,
    /// The latest settled load succeeded
    Succeeded,
    /// The latest settled load failed
    Failed,
}

/// Cloned view of the triple at one instant
#[derive(Debug, Clone)]
pub struct LoadSnapshot<R> {
    pub loading: bool,
    pub result: Option<Payload<R>>,
    pub error: Option<String>,
}

impl<R> LoadSnapshot<R> {
    pub fn phase(&self) -> LoadPhase {
        if self.loading {
            LoadPhase::Loading
        } else if self.error.is_some() {
            LoadPhase::Failed
        } else if self.result.is_some() {
            LoadPhase::Succeeded
        } else {
            LoadPhase::Idle
        }
    }
}

/// The observable `(loading, result, error)` cells of a resource client
#[derive(Debug)]
pub struct LoadState<R> {
    loading: Cell<bool>,
    result: Cell<Option<Payload<R>>>,
    error: Cell<Option<String>>,
}

impl<R> Default for LoadState<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> LoadState<R> {
    /// Idle triple: not loading, no result, no error
    pub fn new() -> Self {
        Self {
            loading: Cell::new(false),
            result: Cell::new(None),
            error: Cell::new(None),
        }
    }

    pub fn loading(&self) -> &Cell<bool> {
        &self.loading
    }

    pub fn result(&self) -> &Cell<Option<Payload<R>>> {
        &self.result
    }

    pub fn error(&self) -> &Cell<Option<String>> {
        &self.error
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn snapshot(&self) -> LoadSnapshot<R> {
        LoadSnapshot {
            loading: self.loading.get(),
            result: self.result.get(),
            error: self.error.get(),
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.snapshot().phase()
    }

    /// A load started: raise `loading` and clear `error`; `result` keeps its stale value
    pub(crate) fn begin(&self) {
        self.loading.set(true);
        self.error.set(None);
    }

    /// A load succeeded; `error` is left as is
    pub(crate) fn succeed(&self, records: Vec<R>) {
        self.result.replace(Some(Arc::new(records)));
    }

    /// A load failed; `result` keeps its stale value
    pub(crate) fn fail(&self, message: String) {
        self.error.set(Some(message));
    }

    /// A load settled, whatever the outcome
    pub(crate) fn finish(&self) {
        self.loading.set(false);
    }
}
