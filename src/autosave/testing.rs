//! Test doubles for the autosave layer.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::core::{Draft, Persist, PersistError};

struct Inner {
    calls: Mutex<Vec<Draft>>,
    failures_left: AtomicUsize,
    held: AtomicBool,
    gate: Semaphore,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(0),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }
}

/// Records every persisted draft. Can fail a number of times, or hold each
/// call until [`MockStore::release`].
#[derive(Clone, Default)]
pub(crate) struct MockStore {
    inner: Arc<Inner>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(times: usize) -> Self {
        let store = Self::new();
        store.inner.failures_left.store(times, Ordering::SeqCst);
        store
    }

    pub(crate) fn held() -> Self {
        let store = Self::new();
        store.inner.held.store(true, Ordering::SeqCst);
        store
    }

    /// Let the held call finish and stop holding later ones.
    pub(crate) fn release(&self) {
        self.inner.held.store(false, Ordering::SeqCst);
        self.inner.gate.add_permits(1);
    }

    pub(crate) fn calls(&self) -> Vec<Draft> {
        self.inner.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.inner.calls.lock().unwrap().len()
    }

    pub(crate) async fn wait_for_calls(&self, n: usize) {
        while self.call_count() < n {
            tokio::task::yield_now().await;
        }
    }
}

impl Persist for MockStore {
    fn persist(&self, draft: Draft) -> impl Future<Output = Result<(), PersistError>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            inner.calls.lock().unwrap().push(draft);
            if inner.held.load(Ordering::SeqCst) {
                inner.gate.acquire().await.unwrap().forget();
            }
            let failed = inner
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(PersistError::Unavailable("backend offline".into()));
            }
            Ok(())
        }
    }
}
