//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic; no I/O happens in this module.

mod account;
mod backup;
pub mod credential;
pub mod ledger;
pub mod money;
pub mod result;
mod session;
mod transaction;

pub use account::{Account, Role};
pub use backup::BackupMetadata;
pub use credential::{Argon2Params, Credential, PinHasher, PinScheme};
pub use ledger::LedgerSnapshot;
pub use session::Session;
pub use transaction::{AuditLog, TransactionKind, TransactionRecord, TIMESTAMP_FORMAT};
