//! In-process token store. Nothing survives the process.

use parking_lot::RwLock;
use veriframe_common::CredentialsStoreMode;

use crate::store::{Result, TokenStore};
use crate::types::AuthRecord;

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: RwLock<AuthRecord>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record.
    pub fn with_record(record: AuthRecord) -> Self {
        Self {
            record: RwLock::new(record),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<AuthRecord> {
        Ok(self.record.read().clone())
    }

    fn update(&self, apply: &mut dyn FnMut(&mut AuthRecord)) -> Result<()> {
        let mut record = self.record.write();
        apply(&mut *record);
        Ok(())
    }

    fn mode(&self) -> CredentialsStoreMode {
        CredentialsStoreMode::Memory
    }
}
