//! Ledger snapshot: the whole persisted state of the machine
//!
//! Every mutation here validates first and only then touches state, and
//! each successful one appends exactly one audit record. Callers run them
//! on a draft copy (see `LedgerStore::transact`), so a failure part-way
//! through never becomes visible.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::{Account, Role};
use super::credential::Credential;
use super::money::{format_amount, require_non_negative, require_positive};
use super::result::{Error, Result};
use super::transaction::{AuditLog, TransactionKind, TransactionRecord};

/// Cash loaded into a brand-new machine
pub const DEFAULT_VAULT_CASH: i64 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Physical cash in the machine, independent of account balances
    #[serde(rename = "atm_cash")]
    pub vault_cash: Decimal,
    #[serde(rename = "users", default)]
    pub accounts: BTreeMap<String, Account>,
    #[serde(default)]
    pub transactions: AuditLog,
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self::new(Decimal::from(DEFAULT_VAULT_CASH))
    }
}

impl LedgerSnapshot {
    pub fn new(vault_cash: Decimal) -> Self {
        Self {
            vault_cash,
            accounts: BTreeMap::new(),
            transactions: AuditLog::new(),
        }
    }

    // === Lookups ===

    pub fn account(&self, username: &str) -> Result<&Account> {
        self.accounts
            .get(username)
            .ok_or_else(|| Error::not_found(format!("account '{}'", username)))
    }

    fn account_mut(&mut self, username: &str) -> Result<&mut Account> {
        self.accounts
            .get_mut(username)
            .ok_or_else(|| Error::not_found(format!("account '{}'", username)))
    }

    pub fn admin_count(&self) -> usize {
        self.accounts.values().filter(|a| a.role.is_admin()).count()
    }

    pub fn has_admin(&self) -> bool {
        self.admin_count() > 0
    }

    /// Fail unless `actor` currently exists with the admin role
    pub fn require_admin(&self, actor: &str) -> Result<()> {
        match self.accounts.get(actor) {
            Some(account) if account.role.is_admin() => Ok(()),
            Some(_) => Err(Error::Forbidden(format!("'{}' is not an admin", actor))),
            None => Err(Error::Forbidden(format!("'{}' no longer exists", actor))),
        }
    }

    fn record(&mut self, user: &str, kind: TransactionKind, amount: Decimal, note: impl Into<String>) {
        self.transactions
            .append(TransactionRecord::new(user, kind, amount, note));
    }

    // === Balance operations ===

    /// Credit `amount` to the account and to the vault. Returns the new balance.
    pub fn deposit(&mut self, username: &str, amount: Decimal) -> Result<Decimal> {
        let amount = require_positive(amount)?;
        let vault_cash = checked_credit(self.vault_cash, amount)?;
        let account = self.account_mut(username)?;
        let balance = checked_credit(account.balance, amount)?;
        account.balance = balance;
        self.vault_cash = vault_cash;
        self.record(username, TransactionKind::Deposit, amount, "");
        Ok(balance)
    }

    /// Debit `amount` from the account and the vault. Returns the new balance.
    pub fn withdraw(&mut self, username: &str, amount: Decimal) -> Result<Decimal> {
        let amount = require_positive(amount)?;
        let vault_cash = self.vault_cash;
        let account = self.account_mut(username)?;
        if account.balance < amount {
            return Err(Error::InsufficientFunds {
                balance: format_amount(account.balance),
            });
        }
        if vault_cash < amount {
            return Err(Error::InsufficientVaultCash);
        }
        // Both operands were checked to be >= amount, so neither goes negative
        let balance = account.balance - amount;
        account.balance = balance;
        self.vault_cash = vault_cash - amount;
        self.record(username, TransactionKind::Withdraw, amount, "");
        Ok(balance)
    }

    /// Replace the vault scalar. `actor` is recorded as the one who did it.
    pub fn set_vault_cash(&mut self, actor: &str, amount: Decimal) -> Result<()> {
        let amount = require_non_negative(amount)?;
        let previous = self.vault_cash;
        self.vault_cash = amount;
        self.record(
            actor,
            TransactionKind::SetAtmCash,
            amount,
            format!("previous={}", format_amount(previous)),
        );
        Ok(())
    }

    // === Account lifecycle ===

    pub fn insert_account(&mut self, username: &str, account: Account) -> Result<()> {
        if self.accounts.contains_key(username) {
            return Err(Error::AlreadyExists(format!("account '{}'", username)));
        }
        let balance = require_non_negative(account.balance)?;
        let note = format!("role={}", account.role);
        self.accounts.insert(username.to_string(), account);
        self.record(username, TransactionKind::CreateUser, balance, note);
        Ok(())
    }

    /// Remove an account. Its audit records stay.
    pub fn remove_account(&mut self, username: &str) -> Result<Account> {
        let account = self.account(username)?;
        if account.role.is_admin() && self.admin_count() == 1 {
            return Err(Error::LastAdmin);
        }
        let removed = self
            .accounts
            .remove(username)
            .ok_or_else(|| Error::not_found(format!("account '{}'", username)))?;
        self.record(username, TransactionKind::DeleteUser, Decimal::ZERO, "deleted");
        Ok(removed)
    }

    pub fn set_role(&mut self, username: &str, role: Role) -> Result<()> {
        let current = self.account(username)?.role;
        if current.is_admin() && !role.is_admin() && self.admin_count() == 1 {
            return Err(Error::LastAdmin);
        }
        self.account_mut(username)?.role = role;
        self.record(
            username,
            TransactionKind::ChangeRole,
            Decimal::ZERO,
            format!("role={}", role),
        );
        Ok(())
    }

    /// Install or clear a credential, logging it under `kind`
    pub fn set_credential(
        &mut self,
        username: &str,
        credential: Option<Credential>,
        kind: TransactionKind,
    ) -> Result<()> {
        self.account_mut(username)?.credential = credential;
        self.record(username, kind, Decimal::ZERO, "");
        Ok(())
    }
}

/// `total + amount`, or InvalidAmount when the sum exceeds what a Decimal holds
fn checked_credit(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| Error::invalid_amount(format!("{} is too large", amount)))
}
