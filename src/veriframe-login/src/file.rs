//! File-based token store.
//!
//! A single JSON document with the keys `access_token`, `refresh_token`
//! and `user_data`, written atomically with 0600 permissions. The file is
//! removed once the record becomes empty.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use veriframe_common::{CredentialsStoreMode, atomic_write};

use crate::store::{Result, TokenStore};
use crate::types::{AuthRecord, StoredAuth};

#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(&self) -> Result<AuthRecord> {
        if !self.path.exists() {
            return Ok(AuthRecord::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<StoredAuth>(&content) {
            Ok(stored) => Ok(stored.into()),
            Err(e) => {
                // An unreadable record is treated as signed out rather than an error on every request
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable credentials file"
                );
                Ok(AuthRecord::default())
            }
        }
    }

    fn write_record(&self, record: &AuthRecord) -> Result<()> {
        if record.is_empty() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {
                    tracing::debug!(path = %self.path.display(), "Removed credentials file");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(&StoredAuth::from(record))?;
        atomic_write(&self.path, &json)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<AuthRecord> {
        let _guard = self.lock.lock();
        self.read_record()
    }

    fn update(&self, apply: &mut dyn FnMut(&mut AuthRecord)) -> Result<()> {
        let _guard = self.lock.lock();
        let mut record = self.read_record()?;
        apply(&mut record);
        self.write_record(&record)
    }

    fn mode(&self) -> CredentialsStoreMode {
        CredentialsStoreMode::File
    }
}
