//! Ledger store - the one object every service shares
//!
//! Holds the in-memory snapshot behind a single lock together with the
//! repository it is persisted to. All mutations go through [`LedgerStore::transact`].

use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::LedgerSnapshot;
use crate::ports::LedgerRepository;

pub struct LedgerStore {
    state: Mutex<LedgerSnapshot>,
    repository: Box<dyn LedgerRepository>,
}

impl LedgerStore {
    /// Load the ledger from `repository`, creating and saving a fresh one
    /// with `initial_vault_cash` if nothing is stored yet
    pub fn open(repository: Box<dyn LedgerRepository>, initial_vault_cash: Decimal) -> Result<Self> {
        let snapshot = match repository.load()? {
            Some(snapshot) => snapshot,
            None => {
                let snapshot = LedgerSnapshot::new(initial_vault_cash);
                repository.save(&snapshot)?;
                debug!(location = %repository.describe(), "initialised new ledger");
                snapshot
            }
        };

        Ok(Self {
            state: Mutex::new(snapshot),
            repository,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerSnapshot>> {
        self.state
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }

    /// Run a read-only query against the current snapshot
    pub fn read<T>(&self, f: impl FnOnce(&LedgerSnapshot) -> Result<T>) -> Result<T> {
        let state = self.lock()?;
        f(&state)
    }

    /// Run `f` as one unit of work
    ///
    /// `f` works on a draft copy. The draft is persisted and only then
    /// becomes the current state; if `f` or the save fails, nothing changes
    /// in memory or on disk.
    pub fn transact<T>(&self, f: impl FnOnce(&mut LedgerSnapshot) -> Result<T>) -> Result<T> {
        let mut state = self.lock()?;
        let mut draft = state.clone();
        let value = f(&mut draft)?;
        self.repository.save(&draft)?;
        *state = draft;
        Ok(value)
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        self.read(|s| Ok(s.clone()))
    }

    pub fn location(&self) -> String {
        self.repository.describe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::MemoryRepository;
    use crate::domain::{Account, Role};

    fn open_store() -> (LedgerStore, Arc<MemoryRepository>) {
        let repo = Arc::new(MemoryRepository::new());
        let store = LedgerStore::open(Box::new(Arc::clone(&repo)), Decimal::from(10_000)).unwrap();
        (store, repo)
    }

    #[test]
    fn test_open_initialises_and_saves() {
        let (store, repo) = open_store();
        assert_eq!(repo.save_count(), 1);
        assert_eq!(store.snapshot().unwrap().vault_cash, Decimal::from(10_000));
    }

    #[test]
    fn test_failed_closure_leaves_state_untouched() {
        let (store, repo) = open_store();
        let result: Result<()> = store.transact(|s| {
            s.vault_cash = Decimal::ZERO;
            Err(Error::InsufficientVaultCash)
        });

        assert!(result.is_err());
        assert_eq!(store.snapshot().unwrap().vault_cash, Decimal::from(10_000));
        assert_eq!(repo.save_count(), 1);
    }

    #[test]
    fn test_failed_save_leaves_memory_untouched() {
        let (store, repo) = open_store();
        repo.fail_saves(true);

        let err = store
            .transact(|s| s.insert_account("alice", Account::new(Role::User, Decimal::ZERO)))
            .unwrap_err();
        assert!(err.is_fatal());

        let snapshot = store.snapshot().unwrap();
        assert!(snapshot.accounts.is_empty());
        assert!(snapshot.transactions.is_empty());
    }

    #[test]
    fn test_successful_transaction_is_persisted() {
        let (store, repo) = open_store();
        store
            .transact(|s| s.insert_account("alice", Account::new(Role::User, Decimal::ZERO)))
            .unwrap();

        assert_eq!(repo.saved().unwrap(), store.snapshot().unwrap());
    }
}
