//! Backup service - ledger archive management
//!
//! Creates ZIP archives holding the current ledger snapshot and the
//! settings file. Archives are write-only from the machine's point of view:
//! the audit trail is permanent, so there is no in-place restore.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::config::SETTINGS_FILE;
use crate::domain::BackupMetadata;
use crate::store::LedgerStore;

const BACKUP_PREFIX: &str = "cashpoint-";
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%6f";

/// Name of the ledger entry inside an archive
pub const LEDGER_ENTRY: &str = "ledger.json";

pub struct BackupService {
    data_dir: PathBuf,
    store: Arc<LedgerStore>,
}

impl BackupService {
    pub fn new(data_dir: PathBuf, store: Arc<LedgerStore>) -> Self {
        Self { data_dir, store }
    }

    fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// Archive the current snapshot and settings, then prune to `max_backups`
    pub fn create(&self, max_backups: Option<usize>) -> Result<BackupMetadata> {
        let backups_dir = self.backups_dir();
        fs::create_dir_all(&backups_dir)?;

        // Taken from memory, so it is always a committed state
        let snapshot = self.store.snapshot()?;
        let ledger_json = serde_json::to_vec_pretty(&snapshot)?;

        let created_at = Local::now().naive_local();
        let backup_name = format!("{}{}.zip", BACKUP_PREFIX, created_at.format(BACKUP_TIME_FORMAT));
        let backup_path = backups_dir.join(&backup_name);

        let file = File::create(&backup_path).context("Failed to create backup file")?;
        let mut zip = ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file(LEDGER_ENTRY, options)?;
        zip.write_all(&ledger_json)?;

        let settings_path = self.data_dir.join(SETTINGS_FILE);
        if settings_path.exists() {
            let settings = fs::read(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            zip.start_file(SETTINGS_FILE, options)?;
            zip.write_all(&settings)?;
        }

        zip.finish()?;

        let size_bytes = fs::metadata(&backup_path)?.len();
        info!(backup = %backup_name, size_bytes, "backup created");

        if let Some(max) = max_backups {
            self.apply_retention(max)?;
        }

        Ok(BackupMetadata::new(backup_name, created_at, size_bytes))
    }

    /// List archives, newest first
    pub fn list(&self) -> Result<Vec<BackupMetadata>> {
        let backups_dir = self.backups_dir();
        if !backups_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&backups_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(created_at) = parse_backup_time(name) else {
                continue;
            };

            let size_bytes = fs::metadata(&path)?.len();
            backups.push(BackupMetadata::new(name, created_at, size_bytes));
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    fn apply_retention(&self, max_backups: usize) -> Result<()> {
        let mut backups = self.list()?;

        while backups.len() > max_backups {
            if let Some(oldest) = backups.pop() {
                debug!(backup = %oldest.name, "pruning backup");
                fs::remove_file(self.backups_dir().join(&oldest.name))?;
            }
        }

        Ok(())
    }
}

/// Creation time encoded in an archive name, or None for foreign files
fn parse_backup_time(name: &str) -> Option<NaiveDateTime> {
    let ts = name.strip_prefix(BACKUP_PREFIX)?.strip_suffix(".zip")?;
    NaiveDateTime::parse_from_str(ts, BACKUP_TIME_FORMAT).ok()
}
