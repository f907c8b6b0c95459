//! Directory service - account lifecycle and authentication

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use super::credential::{validate_pin, CredentialService};
use crate::domain::result::{Error, Result};
use crate::domain::{Account, PinHasher, Role, Session, TransactionKind};
use crate::store::LedgerStore;

/// Username suggested when bootstrapping the first admin
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Result of presenting a username and PIN
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Session),
    /// The account has no PIN yet; run first-time setup before anything else
    SetupRequired(String),
}

/// One row of the account listing
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub username: String,
    pub role: Role,
    pub balance: Decimal,
    pub has_pin: bool,
}

/// Account directory built on the credential store and the ledger
pub struct DirectoryService {
    store: Arc<LedgerStore>,
    credentials: CredentialService,
}

impl DirectoryService {
    pub fn new(store: Arc<LedgerStore>, hasher: PinHasher) -> Self {
        let credentials = CredentialService::new(Arc::clone(&store), hasher);
        Self { store, credentials }
    }

    pub fn credentials(&self) -> &CredentialService {
        &self.credentials
    }

    // === Bootstrap ===

    /// True when no admin account exists and one must be created first
    pub fn needs_admin_bootstrap(&self) -> Result<bool> {
        self.store.read(|ledger| Ok(!ledger.has_admin()))
    }

    /// Create the first admin, with the PIN confirmed by a second entry
    pub fn bootstrap_admin(&self, username: &str, pin: &str, confirm: &str) -> Result<Session> {
        let username = Account::normalize_username(username)?;
        if pin != confirm {
            return Err(Error::PinMismatchOnSetup);
        }
        let credential = self.credentials.issue(pin)?;

        self.store.transact(|ledger| {
            if ledger.has_admin() {
                return Err(Error::Forbidden("an admin account already exists".to_string()));
            }
            let mut account = Account::new(Role::Admin, Decimal::ZERO);
            account.credential = Some(credential);
            ledger.insert_account(&username, account)
        })?;

        info!(user = %username, "bootstrapped admin account");
        Ok(Session::new(username, Role::Admin))
    }

    // === Authentication ===

    pub fn authenticate(&self, username: &str, pin: &str) -> Result<AuthOutcome> {
        let username = username.trim();
        let account = self.store.read(|ledger| Ok(ledger.account(username)?.clone()))?;

        let Some(credential) = account.credential else {
            info!(user = username, "first-time setup required");
            return Ok(AuthOutcome::SetupRequired(username.to_string()));
        };

        if !self.credentials.hasher().verify(&credential, pin)? {
            warn!(user = username, "login rejected");
            return Err(Error::WrongCredential);
        }

        info!(user = username, role = %account.role, "login");
        Ok(AuthOutcome::Authenticated(Session::new(username, account.role)))
    }

    /// Set the first PIN of a credential-less account and log it in
    pub fn complete_first_time_setup(&self, username: &str, pin: &str, confirm: &str) -> Result<Session> {
        let username = username.trim();
        if pin != confirm {
            return Err(Error::PinMismatchOnSetup);
        }
        let credential = self.credentials.issue(pin)?;

        let role = self.store.transact(|ledger| {
            let account = ledger.account(username)?;
            if !account.requires_setup() {
                return Err(Error::Forbidden(format!("'{}' already has a PIN", username)));
            }
            let role = account.role;
            ledger.set_credential(username, Some(credential), TransactionKind::SetupPin)?;
            Ok(role)
        })?;

        info!(user = username, "first-time PIN setup completed");
        Ok(Session::new(username, role))
    }

    // === Lifecycle ===

    /// Create an account (admin only)
    ///
    /// Without a PIN the account is created credential-less and its holder
    /// goes through first-time setup on first login.
    pub fn create_account(
        &self,
        actor: &Session,
        username: &str,
        role: Role,
        initial_balance: Decimal,
        pin: Option<&str>,
    ) -> Result<()> {
        let username = Account::normalize_username(username)?;
        let credential = pin.map(|p| self.credentials.issue(p)).transpose()?;

        self.store.transact(|ledger| {
            ledger.require_admin(&actor.username)?;
            let mut account = Account::new(role, initial_balance);
            account.credential = credential;
            ledger.insert_account(&username, account)
        })?;

        info!(actor = %actor.username, user = %username, %role, "account created");
        Ok(())
    }

    /// Delete an account (admin only). Its audit records remain.
    pub fn delete_account(&self, actor: &Session, username: &str) -> Result<()> {
        let username = username.trim();
        if username == actor.username {
            return Err(Error::Forbidden(
                "cannot delete the account you are logged in with".to_string(),
            ));
        }

        self.store.transact(|ledger| {
            ledger.require_admin(&actor.username)?;
            ledger.remove_account(username).map(|_| ())
        })?;

        info!(actor = %actor.username, user = username, "account deleted");
        Ok(())
    }

    /// Change an account's role (admin only)
    pub fn change_role(&self, actor: &Session, username: &str, role: Role) -> Result<()> {
        let username = username.trim();
        self.store.transact(|ledger| {
            ledger.require_admin(&actor.username)?;
            ledger.set_role(username, role)
        })?;

        info!(actor = %actor.username, user = username, %role, "role changed");
        Ok(())
    }

    /// Change a PIN after checking the current one
    ///
    /// An account that has no PIN yet skips the check. A fresh salt is
    /// generated either way.
    pub fn change_pin(&self, username: &str, old_pin: &str, new_pin: &str) -> Result<()> {
        validate_pin(new_pin)?;
        let hasher = self.credentials.hasher();
        let credential = hasher.issue(new_pin)?;

        self.store.transact(|ledger| {
            if let Some(current) = &ledger.account(username)?.credential {
                if !hasher.verify(current, old_pin)? {
                    return Err(Error::WrongCredential);
                }
            }
            ledger.set_credential(username, Some(credential), TransactionKind::ChangePin)
        })
        .map_err(|e| {
            if matches!(e, Error::WrongCredential) {
                warn!(user = username, "PIN change rejected");
            }
            e
        })?;

        info!(user = username, "PIN changed");
        Ok(())
    }

    /// Clear an account's PIN so its holder must set a new one (admin only)
    pub fn reset_pin(&self, actor: &Session, username: &str) -> Result<()> {
        let username = username.trim();
        self.store.transact(|ledger| {
            ledger.require_admin(&actor.username)?;
            ledger.set_credential(username, None, TransactionKind::ResetPin)
        })?;

        info!(actor = %actor.username, user = username, "PIN reset");
        Ok(())
    }

    // === Queries ===

    pub fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        self.store.read(|ledger| {
            Ok(ledger
                .accounts
                .iter()
                .map(|(username, account)| AccountSummary {
                    username: username.clone(),
                    role: account.role,
                    balance: account.balance,
                    has_pin: !account.requires_setup(),
                })
                .collect())
        })
    }

    pub fn role_of(&self, username: &str) -> Result<Role> {
        self.store.read(|ledger| Ok(ledger.account(username)?.role))
    }
}
