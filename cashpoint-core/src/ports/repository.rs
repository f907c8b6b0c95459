//! Repository port - persistence abstraction

use crate::domain::result::Result;
use crate::domain::LedgerSnapshot;

/// Durable home of the ledger snapshot
///
/// The core never touches files directly; it loads once at startup and
/// hands every committed snapshot to `save`. An implementation must make
/// `save` atomic: after a crash, `load` returns either the previous or the
/// new snapshot, never a mix.
pub trait LedgerRepository: Send + Sync {
    /// Load the persisted snapshot, or `None` if nothing was saved yet
    fn load(&self) -> Result<Option<LedgerSnapshot>>;

    /// Persist a complete snapshot, replacing the previous one
    fn save(&self, snapshot: &LedgerSnapshot) -> Result<()>;

    /// Human-readable location, for status output
    fn describe(&self) -> String;
}

impl<T: LedgerRepository + ?Sized> LedgerRepository for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<LedgerSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
