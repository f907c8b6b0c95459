//! PIN credential model and hashing
//!
//! A credential is a random per-account salt plus a one-way digest of
//! `salt ‖ pin`. Two schemes exist:
//!
//! - `sha256`: `hex(SHA-256(salt_hex ‖ pin))` with an 8-byte salt. This is the
//!   format of older ledger files and is kept so they keep verifying.
//! - `argon2id`: Argon2id over the PIN with a 16-byte salt. Default for every
//!   credential written from now on.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::result::{Error, Result};

/// Default Argon2id parameters
pub const DEFAULT_TIME_COST: u32 = 3;
pub const DEFAULT_MEMORY_COST: u32 = 19456; // 19 MiB
pub const DEFAULT_PARALLELISM: u32 = 1;
pub const DEFAULT_HASH_LEN: u32 = 32;

const LEGACY_SALT_LEN: usize = 8;
const ARGON2_SALT_LEN: usize = 16;

/// Digest used to protect a PIN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinScheme {
    Sha256,
    Argon2id,
}

impl Default for PinScheme {
    fn default() -> Self {
        PinScheme::Argon2id
    }
}

impl std::str::FromStr for PinScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sha256" => Ok(PinScheme::Sha256),
            "argon2id" | "argon2" => Ok(PinScheme::Argon2id),
            other => Err(Error::Config(format!("unknown PIN scheme '{}'", other))),
        }
    }
}

/// Argon2id parameters for PIN hashing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argon2Params {
    pub time_cost: u32,
    pub memory_cost: u32,
    pub parallelism: u32,
    pub hash_len: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
            hash_len: DEFAULT_HASH_LEN,
        }
    }
}

/// Salt and digest for one account. Both are hex encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub scheme: PinScheme,
    pub salt: String,
    pub hash: String,
}

/// Creates and checks credentials
#[derive(Debug, Clone, Default)]
pub struct PinHasher {
    scheme: PinScheme,
    argon2: Argon2Params,
}

impl PinHasher {
    pub fn new(scheme: PinScheme, argon2: Argon2Params) -> Self {
        Self { scheme, argon2 }
    }

    /// Issue a credential for `pin` under a freshly generated salt
    pub fn issue(&self, pin: &str) -> Result<Credential> {
        let salt_len = match self.scheme {
            PinScheme::Sha256 => LEGACY_SALT_LEN,
            PinScheme::Argon2id => ARGON2_SALT_LEN,
        };
        let mut salt = vec![0u8; salt_len];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = hex::encode(salt);

        let hash = self.digest(self.scheme, &salt, pin)?;
        Ok(Credential {
            scheme: self.scheme,
            salt,
            hash,
        })
    }

    /// Recompute the digest with the credential's own scheme and compare
    pub fn verify(&self, credential: &Credential, pin: &str) -> Result<bool> {
        let computed = self.digest(credential.scheme, &credential.salt, pin)?;
        Ok(constant_time_eq(computed.as_bytes(), credential.hash.as_bytes()))
    }

    fn digest(&self, scheme: PinScheme, salt: &str, pin: &str) -> Result<String> {
        match scheme {
            PinScheme::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(salt.as_bytes());
                hasher.update(pin.as_bytes());
                Ok(hex::encode(hasher.finalize()))
            }
            PinScheme::Argon2id => {
                let salt = hex::decode(salt)
                    .map_err(|e| Error::storage(format!("corrupt PIN salt: {}", e)))?;
                let params = Params::new(
                    self.argon2.memory_cost,
                    self.argon2.time_cost,
                    self.argon2.parallelism,
                    Some(self.argon2.hash_len as usize),
                )
                .map_err(|e| Error::Config(format!("invalid argon2 params: {}", e)))?;
                let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

                let mut out = vec![0u8; self.argon2.hash_len as usize];
                argon2
                    .hash_password_into(pin.as_bytes(), &salt, &mut out)
                    .map_err(|e| Error::storage(format!("failed to hash PIN: {}", e)))?;
                Ok(hex::encode(out))
            }
        }
    }
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
