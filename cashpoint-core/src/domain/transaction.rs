//! Audit trail domain model

use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Timestamp format used in the ledger file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What a transaction record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    CreateUser,
    DeleteUser,
    ChangePin,
    SetupPin,
    ResetPin,
    ChangeRole,
    Deposit,
    Withdraw,
    SetAtmCash,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::CreateUser => "create_user",
            TransactionKind::DeleteUser => "delete_user",
            TransactionKind::ChangePin => "change_pin",
            TransactionKind::SetupPin => "setup_pin",
            TransactionKind::ResetPin => "reset_pin",
            TransactionKind::ChangeRole => "change_role",
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::SetAtmCash => "set_atm_cash",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable entry in the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "time", with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub user: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(default)]
    pub note: String,
}

impl TransactionRecord {
    pub fn new(
        user: impl Into<String>,
        kind: TransactionKind,
        amount: Decimal,
        note: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: now(),
            user: user.into(),
            kind,
            amount,
            note: note.into(),
        }
    }
}

/// Local wall-clock time truncated to whole seconds
fn now() -> NaiveDateTime {
    let local = Local::now().naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}

/// Append-only sequence of transaction records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    records: Vec<TransactionRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, keeping timestamps non-decreasing
    ///
    /// If the wall clock went backwards the record is stamped with its
    /// predecessor's time instead.
    pub fn append(&mut self, mut record: TransactionRecord) {
        if let Some(last) = self.records.last() {
            if record.timestamp < last.timestamp {
                record.timestamp = last.timestamp;
            }
        }
        self.records.push(record);
    }

    /// The last `n` records, oldest first
    pub fn tail(&self, n: usize) -> &[TransactionRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn last(&self) -> Option<&TransactionRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
