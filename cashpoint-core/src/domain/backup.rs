//! Backup archive metadata

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Metadata for a backup archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// Archive filename (e.g., "cashpoint-2025-01-15T10-30-00-000123.zip")
    pub name: String,
    /// Local time the archive was written
    pub created_at: NaiveDateTime,
    pub size_bytes: u64,
}

impl BackupMetadata {
    pub fn new(name: impl Into<String>, created_at: NaiveDateTime, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            created_at,
            size_bytes,
        }
    }

    /// Format size for human display
    pub fn size_display(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;

        if self.size_bytes >= MB {
            format!("{:.1} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.1} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", self.size_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_display() {
        let now = chrono::Local::now().naive_local();
        assert_eq!(BackupMetadata::new("a.zip", now, 900).size_display(), "900 bytes");
        assert_eq!(BackupMetadata::new("a.zip", now, 1536).size_display(), "1.5 KB");
        assert_eq!(BackupMetadata::new("a.zip", now, 3 * 1024 * 1024).size_display(), "3.0 MB");
    }
}
