//! In-memory repository, for tests and throwaway sessions

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::result::{Error, Result};
use crate::domain::LedgerSnapshot;
use crate::ports::LedgerRepository;

/// Keeps the last saved snapshot in memory
///
/// `fail_saves` makes every subsequent `save` fail with a storage error,
/// which is how tests simulate an unwritable medium.
#[derive(Default)]
pub struct MemoryRepository {
    saved: Mutex<Option<LedgerSnapshot>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// The snapshot as last persisted
    pub fn saved(&self) -> Option<LedgerSnapshot> {
        self.saved.lock().ok().and_then(|s| s.clone())
    }
}

impl LedgerRepository for MemoryRepository {
    fn load(&self) -> Result<Option<LedgerSnapshot>> {
        let saved = self
            .saved
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        Ok(saved.clone())
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::storage("simulated write failure"));
        }
        let mut saved = self
            .saved
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
        *saved = Some(snapshot.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
