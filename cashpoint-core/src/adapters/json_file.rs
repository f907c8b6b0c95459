//! JSON file repository implementation
//!
//! Stores the whole ledger as one pretty-printed JSON document. Writes go
//! to a temp file in the same directory, are fsynced, then renamed over the
//! target, so a crash leaves either the old or the new file in place.
//!
//! The repository also holds an exclusive lock on `<file>.lock` for as long
//! as it lives, which keeps a second session off the same ledger.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::LedgerSnapshot;
use crate::ports::LedgerRepository;

/// Maximum number of attempts when the ledger is locked by another session
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Ledger persisted as a single JSON file
pub struct JsonFileRepository {
    path: PathBuf,
    // Held for the lifetime of the repository; dropping it releases the lock
    _lock: File,
}

impl JsonFileRepository {
    /// Open the ledger file at `path`, taking the session lock
    ///
    /// The file itself does not need to exist yet. If another session holds
    /// the lock, retries with exponential backoff before giving up.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lock_path = lock_path_for(path);
        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        for attempt in 0..MAX_RETRIES {
            match lock.try_lock_exclusive() {
                Ok(()) => {
                    debug!(path = %path.display(), "acquired ledger lock");
                    return Ok(Self {
                        path: path.to_path_buf(),
                        _lock: lock,
                    });
                }
                Err(e) if is_contended(&e) && attempt < MAX_RETRIES - 1 => {
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                    warn!(
                        attempt = attempt + 1,
                        max = MAX_RETRIES,
                        delay_ms = delay.as_millis() as u64,
                        "ledger is locked by another session, retrying"
                    );
                    thread::sleep(delay);
                }
                Err(e) if is_contended(&e) => break,
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Err(Error::storage(format!(
            "ledger {} is in use by another session",
            path.display()
        )))
    }
}

impl LedgerRepository for JsonFileRepository {
    fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content).map_err(|e| {
            Error::storage(format!("corrupt ledger file {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), "loaded ledger");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            Error::storage(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;

        debug!(path = %self.path.display(), records = snapshot.transactions.len(), "saved ledger");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger".into());
    name.push(".lock");
    path.with_file_name(name)
}

fn is_contended(err: &std::io::Error) -> bool {
    err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
        || err.kind() == std::io::ErrorKind::WouldBlock
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let repo = JsonFileRepository::open(&dir.path().join("ledger.json")).unwrap();
        assert!(repo.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let repo = JsonFileRepository::open(&path).unwrap();

        let snapshot = LedgerSnapshot::new(Decimal::new(2500, 0));
        repo.save(&snapshot).unwrap();

        assert!(path.exists());
        assert_eq!(repo.load().unwrap(), Some(snapshot));
        // No temp files left next to the ledger
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();

        let repo = JsonFileRepository::open(&path).unwrap();
        let err = repo.load().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path_for(Path::new("/data/ledger.json")),
            PathBuf::from("/data/ledger.json.lock")
        );
    }
}
