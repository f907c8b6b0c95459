//! Audit service - read access to the transaction log

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::money::format_amount;
use crate::domain::result::{Error, Result};
use crate::domain::{TransactionRecord, TIMESTAMP_FORMAT};
use crate::store::LedgerStore;

const CSV_HEADER: [&str; 5] = ["time", "user", "type", "amount", "note"];

/// Audit log queries. The log itself is append-only and has no write API here.
pub struct AuditService {
    store: Arc<LedgerStore>,
}

impl AuditService {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// The most recent `n` records, oldest first
    pub fn tail(&self, n: usize) -> Result<Vec<TransactionRecord>> {
        self.store
            .read(|ledger| Ok(ledger.transactions.tail(n).to_vec()))
    }

    pub fn len(&self) -> Result<usize> {
        self.store.read(|ledger| Ok(ledger.transactions.len()))
    }

    /// All records naming `username`, including ones for deleted accounts
    pub fn history_for(&self, username: &str) -> Result<Vec<TransactionRecord>> {
        self.store.read(|ledger| {
            Ok(ledger
                .transactions
                .iter()
                .filter(|r| r.user == username)
                .cloned()
                .collect())
        })
    }

    /// Write the whole log to `path` as CSV. Returns the number of records.
    pub fn export_csv(&self, path: &Path) -> Result<usize> {
        let records = self.store.read(|ledger| Ok(ledger.transactions.iter().cloned().collect::<Vec<_>>()))?;

        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
        writer.write_record(CSV_HEADER).map_err(csv_error)?;
        for record in &records {
            writer
                .write_record([
                    record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                    record.user.clone(),
                    record.kind.as_str().to_string(),
                    format_amount(record.amount),
                    record.note.clone(),
                ])
                .map_err(csv_error)?;
        }
        writer.flush()?;

        info!(path = %path.display(), count = records.len(), "exported audit log");
        Ok(records.len())
    }
}

fn csv_error(e: csv::Error) -> Error {
    Error::storage(format!("CSV export failed: {}", e))
}
