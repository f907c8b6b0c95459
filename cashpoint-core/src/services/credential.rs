//! Credential service - PIN issue and verification

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{Credential, PinHasher, TransactionKind};
use crate::store::LedgerStore;

/// Credential store for per-account PINs
pub struct CredentialService {
    store: Arc<LedgerStore>,
    hasher: PinHasher,
}

impl CredentialService {
    pub fn new(store: Arc<LedgerStore>, hasher: PinHasher) -> Self {
        Self { store, hasher }
    }

    pub fn hasher(&self) -> &PinHasher {
        &self.hasher
    }

    /// Issue a credential for `pin` with a fresh salt
    pub fn issue(&self, pin: &str) -> Result<Credential> {
        validate_pin(pin)?;
        self.hasher.issue(pin)
    }

    /// Replace the account's credential, invalidating the previous one
    pub fn set_credential(&self, username: &str, pin: &str) -> Result<()> {
        let credential = self.issue(pin)?;
        self.store.transact(|ledger| {
            let kind = if ledger.account(username)?.requires_setup() {
                TransactionKind::SetupPin
            } else {
                TransactionKind::ChangePin
            };
            ledger.set_credential(username, Some(credential), kind)
        })?;
        info!(user = username, "credential set");
        Ok(())
    }

    /// Check `pin` against the account's credential
    ///
    /// Fails closed: an account without a credential never verifies.
    pub fn verify(&self, username: &str, pin: &str) -> Result<bool> {
        let credential = self
            .store
            .read(|ledger| Ok(ledger.account(username)?.credential.clone()))?;

        let Some(credential) = credential else {
            return Ok(false);
        };
        let ok = self.hasher.verify(&credential, pin)?;
        if !ok {
            warn!(user = username, "PIN verification failed");
        }
        Ok(ok)
    }

    pub fn has_credential(&self, username: &str) -> Result<bool> {
        self.store
            .read(|ledger| Ok(!ledger.account(username)?.requires_setup()))
    }
}

/// Reject PINs that cannot be meaningfully hashed
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.is_empty() {
        return Err(Error::InvalidPin("PIN cannot be empty".to_string()));
    }
    Ok(())
}
