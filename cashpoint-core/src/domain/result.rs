//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Every variant except the storage ones describes a rejected request that
/// left the ledger untouched. The controller reports those and re-prompts.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Wrong PIN")]
    WrongCredential,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: balance is {balance}")]
    InsufficientFunds { balance: String },

    #[error("Insufficient cash in machine")]
    InsufficientVaultCash,

    #[error("Invalid PIN: {0}")]
    InvalidPin(String),

    #[error("PIN entries do not match")]
    PinMismatchOnSetup,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid role: {0} (expected admin or user)")]
    InvalidRole(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("Cannot remove the last admin account")]
    LastAdmin,

    #[error("PIN setup required for {0}")]
    CredentialRequired(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid amount error
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for faults of the persistence medium, which should end the process
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Config(_) | Self::Io(_) | Self::Json(_)
        )
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
