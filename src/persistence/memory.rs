use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;

use crate::persistence::{PersistenceAdapter, PersistenceError};
use crate::words::WordsSnapshot;

/// Process-local adapter. Failure switches let callers exercise the
/// fallback paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<Option<WordsSnapshot>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: WordsSnapshot) -> Self {
        let store = Self::default();
        *store.snapshot.lock() = Some(snapshot);
        store
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<WordsSnapshot> {
        self.snapshot.lock().clone()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn load(&self) -> BoxFuture<'_, Result<WordsSnapshot, PersistenceError>> {
        let result = if self.fail_loads.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable("memory store load disabled".to_string()))
        } else {
            Ok(self.snapshot.lock().clone().unwrap_or_default())
        };
        futures::future::ready(result).boxed()
    }

    fn save<'a>(
        &'a self,
        snapshot: &'a WordsSnapshot,
    ) -> BoxFuture<'a, Result<(), PersistenceError>> {
        let result = if self.fail_saves.load(Ordering::SeqCst) {
            Err(PersistenceError::Unavailable("memory store save disabled".to_string()))
        } else {
            *self.snapshot.lock() = Some(snapshot.clone());
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        futures::future::ready(result).boxed()
    }
}
