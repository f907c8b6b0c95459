//! Account domain model

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::credential::{Credential, PinScheme};
use super::result::Error;

/// Role of an account holder, used to route admin vs user menus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "" => Err(Error::InvalidRole("(blank)".to_string())),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

/// A customer or operator account held by the machine
///
/// The username is the key in the ledger map and is not stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AccountRecord", into = "AccountRecord")]
pub struct Account {
    pub role: Role,
    pub credential: Option<Credential>,
    pub balance: Decimal,
}

/// On-disk shape of an account: salt and hash are nullable side by side
#[derive(Serialize, Deserialize)]
struct AccountRecord {
    #[serde(default)]
    role: Role,
    #[serde(default)]
    pin_salt: Option<String>,
    #[serde(default)]
    pin_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pin_scheme: Option<PinScheme>,
    #[serde(default)]
    balance: Decimal,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        // Files written before schemes were recorded only ever used SHA-256
        let credential = match (record.pin_salt, record.pin_hash) {
            (Some(salt), Some(hash)) => Some(Credential {
                scheme: record.pin_scheme.unwrap_or(PinScheme::Sha256),
                salt,
                hash,
            }),
            _ => None,
        };
        Self {
            role: record.role,
            credential,
            balance: record.balance,
        }
    }
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        let (pin_salt, pin_hash, pin_scheme) = match account.credential {
            Some(c) => (Some(c.salt), Some(c.hash), Some(c.scheme)),
            None => (None, None, None),
        };
        Self {
            role: account.role,
            pin_salt,
            pin_hash,
            pin_scheme,
            balance: account.balance,
        }
    }
}

impl Account {
    /// Create a credential-less account
    pub fn new(role: Role, balance: Decimal) -> Self {
        Self {
            role,
            credential: None,
            balance,
        }
    }

    /// Whether the holder still has to go through first-time PIN setup
    pub fn requires_setup(&self) -> bool {
        self.credential.is_none()
    }

    /// Normalize and validate a username
    pub fn normalize_username(username: &str) -> Result<String, Error> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidUsername("username cannot be empty".to_string()));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(Error::InvalidUsername(format!(
                "'{}' contains control characters",
                trimmed.escape_debug()
            )));
        }
        Ok(trimmed.to_string())
    }
}
