//! The token store contract.
//!
//! A backend only implements [`TokenStore::load`] and
//! [`TokenStore::update`]; every higher-level operation is written once on
//! top of those two so all backends share the same semantics:
//! absence is a value, writes overwrite, `clear` is idempotent.

use std::sync::Arc;

use secrecy::SecretString;
use veriframe_common::{AppDirs, ApiConfig, CredentialsStoreMode};

use crate::file::FileTokenStore;
use crate::keyring::KeyringTokenStore;
use crate::memory::MemoryTokenStore;
use crate::types::{AuthRecord, TokenPair, UserProfile};

/// Errors that can occur while reading or writing persisted credentials.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize credentials: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Keyring error: {0}")]
    Keyring(String),
}

/// Result type for token store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Process-wide persisted session credentials.
///
/// Shared as `Arc<dyn TokenStore>` between the session manager and the
/// HTTP client's refresh path.
pub trait TokenStore: Send + Sync {
    /// Read the full persisted record. Missing data is an empty record.
    fn load(&self) -> Result<AuthRecord>;

    /// Read-modify-write the record while holding the backend's lock.
    fn update(&self, apply: &mut dyn FnMut(&mut AuthRecord)) -> Result<()>;

    /// Which backend this is.
    fn mode(&self) -> CredentialsStoreMode;

    /// Both tokens, if both are stored.
    fn get(&self) -> Result<Option<TokenPair>> {
        Ok(self.load()?.token_pair())
    }

    fn access_token(&self) -> Result<Option<SecretString>> {
        Ok(self.load()?.access_token)
    }

    fn refresh_token(&self) -> Result<Option<SecretString>> {
        Ok(self.load()?.refresh_token)
    }

    /// Replace both tokens.
    fn set(&self, pair: &TokenPair) -> Result<()> {
        self.update(&mut |record: &mut AuthRecord| {
            record.access_token = Some(pair.access_secret().clone());
            record.refresh_token = Some(pair.refresh_secret().clone());
        })
    }

    /// Replace only the access token (used after a refresh).
    fn set_access_token(&self, token: &SecretString) -> Result<()> {
        self.update(&mut |record: &mut AuthRecord| record.access_token = Some(token.clone()))
    }

    /// Remove tokens and the cached profile.
    fn clear(&self) -> Result<()> {
        self.update(&mut |record: &mut AuthRecord| *record = AuthRecord::default())
    }

    fn cached_user(&self) -> Result<Option<UserProfile>> {
        Ok(self.load()?.user)
    }

    fn set_cached_user(&self, user: &UserProfile) -> Result<()> {
        self.update(&mut |record: &mut AuthRecord| record.user = Some(user.clone()))
    }
}

/// Open the backend selected by configuration.
pub fn open_token_store(config: &ApiConfig, dirs: &AppDirs) -> Arc<dyn TokenStore> {
    match config.credentials_store {
        CredentialsStoreMode::File => Arc::new(FileTokenStore::new(dirs.auth_file())),
        CredentialsStoreMode::Keyring => {
            Arc::new(KeyringTokenStore::with_service(&config.keyring_service))
        }
        CredentialsStoreMode::Memory => Arc::new(MemoryTokenStore::new()),
    }
}
