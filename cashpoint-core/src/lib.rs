//! Cashpoint Core - PIN-authenticated cash machine ledger
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Credential, LedgerSnapshot, AuditLog)
//! - **ports**: Trait definitions for external dependencies (LedgerRepository)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (JSON file, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::JsonFileRepository;
use config::Config;
use ports::LedgerRepository;
use services::*;
use store::LedgerStore;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{Account, BackupMetadata, Role, Session, TransactionKind, TransactionRecord};

/// Ledger file inside the data directory
pub const LEDGER_FILE: &str = "ledger.json";

/// Main context for cash machine operations
///
/// This is the primary entry point for all business logic. It holds
/// the ledger store, configuration, and all services.
pub struct CashpointContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub store: Arc<LedgerStore>,
    pub directory_service: DirectoryService,
    pub ledger_service: LedgerService,
    pub audit_service: AuditService,
    pub status_service: StatusService,
    pub backup_service: BackupService,
}

impl CashpointContext {
    /// Open the ledger in `data_dir`, creating it on first use
    ///
    /// Holds the data directory's session lock until dropped.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;
        let repository = JsonFileRepository::open(&data_dir.join(LEDGER_FILE))?;
        Self::with_repository(data_dir, config, Box::new(repository))
    }

    /// Build a context over an arbitrary repository
    pub fn with_repository(
        data_dir: &Path,
        config: Config,
        repository: Box<dyn LedgerRepository>,
    ) -> Result<Self> {
        let store = Arc::new(LedgerStore::open(repository, config.initial_vault_cash)?);

        let directory_service = DirectoryService::new(Arc::clone(&store), config.pin_hasher());
        let ledger_service = LedgerService::new(Arc::clone(&store));
        let audit_service = AuditService::new(Arc::clone(&store));
        let status_service = StatusService::new(Arc::clone(&store));
        let backup_service = BackupService::new(data_dir.to_path_buf(), Arc::clone(&store));

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            store,
            directory_service,
            ledger_service,
            audit_service,
            status_service,
            backup_service,
        })
    }

    /// Dispatcher for commands issued by an authenticated session
    pub fn dispatcher(&self) -> Dispatcher<'_> {
        Dispatcher::new(
            &self.directory_service,
            &self.ledger_service,
            &self.audit_service,
            &self.status_service,
            self.config.transaction_tail_limit,
        )
    }
}
