//! Status service - machine summary

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::domain::TIMESTAMP_FORMAT;
use crate::store::LedgerStore;

/// Status service for the machine overview
pub struct StatusService {
    store: Arc<LedgerStore>,
}

impl StatusService {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    pub fn summary(&self) -> Result<StatusSummary> {
        let location = self.store.location();
        self.store.read(|ledger| {
            let credential_less = ledger
                .accounts
                .values()
                .filter(|a| a.requires_setup())
                .count();
            let total_balances = ledger
                .accounts
                .values()
                .try_fold(Decimal::ZERO, |total, a| total.checked_add(a.balance))
                .ok_or_else(|| Error::invalid_amount("sum of balances is too large to show"))?;

            Ok(StatusSummary {
                vault_cash: ledger.vault_cash,
                total_accounts: ledger.accounts.len(),
                admin_accounts: ledger.admin_count(),
                pending_setup: credential_less,
                total_balances,
                total_transactions: ledger.transactions.len(),
                last_activity: ledger
                    .transactions
                    .last()
                    .map(|r| r.timestamp.format(TIMESTAMP_FORMAT).to_string()),
                location,
            })
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub vault_cash: Decimal,
    pub total_accounts: usize,
    pub admin_accounts: usize,
    /// Accounts that still need first-time PIN setup
    pub pending_setup: usize,
    /// Sum of account balances; not related to `vault_cash`
    pub total_balances: Decimal,
    pub total_transactions: usize,
    pub last_activity: Option<String>,
    pub location: String,
}
