//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "initialVaultCash": 10000,
//!   "pinScheme": "argon2id",
//!   "argon2": { "timeCost": 3, "memoryCost": 19456, "parallelism": 1, "hashLen": 32 },
//!   "transactionTailLimit": 20,
//!   "maxBackups": 10
//! }
//! ```
//! Every key is optional. Unknown keys are ignored.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::ledger::DEFAULT_VAULT_CASH;
use crate::domain::{Argon2Params, PinHasher, PinScheme};

pub const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    initial_vault_cash: Option<Decimal>,
    #[serde(default)]
    pin_scheme: Option<PinScheme>,
    #[serde(default)]
    argon2: Option<Argon2Params>,
    #[serde(default)]
    transaction_tail_limit: Option<usize>,
    #[serde(default)]
    max_backups: Option<usize>,
}

/// Machine configuration (resolved view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    pub initial_vault_cash: Decimal,
    pub pin_scheme: PinScheme,
    pub argon2: Argon2Params,
    pub transaction_tail_limit: usize,
    pub max_backups: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_vault_cash: Decimal::from(DEFAULT_VAULT_CASH),
            pin_scheme: PinScheme::default(),
            argon2: Argon2Params::default(),
            transaction_tail_limit: 20,
            max_backups: 10,
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// Environment overrides (for CI/testing):
    /// - `CASHPOINT_PIN_SCHEME`: `argon2id` or `sha256`
    /// - `CASHPOINT_INITIAL_VAULT_CASH`: decimal amount
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings in {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        let defaults = Config::default();

        let pin_scheme = match std::env::var("CASHPOINT_PIN_SCHEME").ok() {
            Some(value) => value.parse::<PinScheme>()?,
            None => raw.pin_scheme.unwrap_or(defaults.pin_scheme),
        };

        let initial_vault_cash = match std::env::var("CASHPOINT_INITIAL_VAULT_CASH").ok() {
            Some(value) => crate::domain::money::parse_amount(&value)
                .context("CASHPOINT_INITIAL_VAULT_CASH")?,
            None => raw.initial_vault_cash.unwrap_or(defaults.initial_vault_cash),
        };
        if initial_vault_cash < Decimal::ZERO {
            anyhow::bail!("initialVaultCash cannot be negative");
        }

        Ok(Self {
            initial_vault_cash,
            pin_scheme,
            argon2: raw.argon2.unwrap_or(defaults.argon2),
            transaction_tail_limit: raw
                .transaction_tail_limit
                .unwrap_or(defaults.transaction_tail_limit),
            max_backups: raw.max_backups.unwrap_or(defaults.max_backups),
        })
    }

    /// Hasher for newly issued PIN credentials
    pub fn pin_hasher(&self) -> PinHasher {
        PinHasher::new(self.pin_scheme, self.argon2.clone())
    }
}
