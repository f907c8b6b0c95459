//! Ledger service - balances and vault cash

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::domain::result::{Error, Result};
use crate::domain::{LedgerSnapshot, Session};
use crate::store::LedgerStore;

/// Ledger service for balance operations
pub struct LedgerService {
    store: Arc<LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Credit the account and the vault. Returns the new balance.
    pub fn deposit(&self, username: &str, amount: Decimal) -> Result<Decimal> {
        let balance = self.store.transact(|ledger| {
            require_credential(ledger, username)?;
            ledger.deposit(username, amount)
        })?;
        info!(user = username, %amount, %balance, "deposit");
        Ok(balance)
    }

    /// Debit the account and the vault. Returns the new balance.
    ///
    /// Fails with `InsufficientFunds` or `InsufficientVaultCash`, leaving
    /// both untouched.
    pub fn withdraw(&self, username: &str, amount: Decimal) -> Result<Decimal> {
        let balance = self.store.transact(|ledger| {
            require_credential(ledger, username)?;
            ledger.withdraw(username, amount)
        })?;
        info!(user = username, %amount, %balance, "withdraw");
        Ok(balance)
    }

    pub fn balance_of(&self, username: &str) -> Result<Decimal> {
        self.store.read(|ledger| Ok(ledger.account(username)?.balance))
    }

    pub fn vault_cash(&self) -> Result<Decimal> {
        self.store.read(|ledger| Ok(ledger.vault_cash))
    }

    /// Replace the vault scalar (admin only)
    pub fn set_vault_cash(&self, actor: &Session, amount: Decimal) -> Result<()> {
        self.store.transact(|ledger| {
            ledger.require_admin(&actor.username)?;
            ledger.set_vault_cash(&actor.username, amount)
        })?;
        info!(actor = %actor.username, %amount, "vault cash set");
        Ok(())
    }
}

/// Balance operations are authenticated actions: the holder must have a PIN
fn require_credential(ledger: &LedgerSnapshot, username: &str) -> Result<()> {
    if ledger.account(username)?.requires_setup() {
        return Err(Error::CredentialRequired(username.to_string()));
    }
    Ok(())
}
