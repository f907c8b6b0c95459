//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic over the shared [`LedgerStore`](crate::store::LedgerStore).
//! Each service focuses on a specific use case or feature area.

mod audit;
mod backup;
mod credential;
mod directory;
mod dispatch;
mod ledger;
mod status;

pub use audit::AuditService;
pub use backup::{BackupService, LEDGER_ENTRY};
pub use credential::{validate_pin, CredentialService};
pub use directory::{AccountSummary, AuthOutcome, DirectoryService, DEFAULT_ADMIN_USERNAME};
pub use dispatch::{Command, CommandOutput, Dispatcher};
pub use ledger::LedgerService;
pub use status::{StatusService, StatusSummary};
