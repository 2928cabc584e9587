//! Keyring-based token store.
//!
//! Each key (`access_token`, `refresh_token`, `user_data`) is a separate
//! entry under one service name in the OS keychain:
//! - Windows: Credential Manager
//! - macOS: Keychain
//! - Linux: Secret Service / kernel keyutils

use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use veriframe_common::CredentialsStoreMode;

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
use crate::store::{Result, StoreError, TokenStore};
use crate::types::{AuthRecord, UserProfile};

impl From<keyring::Error> for StoreError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoStorageAccess(_) => {
                StoreError::Keyring("Cannot access keyring storage".to_string())
            }
            keyring::Error::PlatformFailure(_) => {
                StoreError::Keyring("Platform-specific keyring failure".to_string())
            }
            _ => StoreError::Keyring(err.to_string()),
        }
    }
}

pub struct KeyringTokenStore {
    service: String,
    lock: Mutex<()>,
}

impl std::fmt::Debug for KeyringTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringTokenStore")
            .field("service", &self.service)
            .finish()
    }
}

impl KeyringTokenStore {
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, key)?)
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: Option<&str>) -> Result<()> {
        let entry = self.entry(key)?;
        match value {
            Some(value) => {
                entry.set_password(value)?;
                debug!(key, "Stored credential in keyring");
            }
            None => match entry.delete_credential() {
                Ok(()) => debug!(key, "Deleted credential from keyring"),
                Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    fn read_record(&self) -> Result<AuthRecord> {
        let user = match self.read(USER_DATA_KEY)? {
            Some(json) => match serde_json::from_str::<UserProfile>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring unreadable cached profile in keyring");
                    None
                }
            },
            None => None,
        };

        Ok(AuthRecord {
            access_token: self.read(ACCESS_TOKEN_KEY)?.map(SecretString::from),
            refresh_token: self.read(REFRESH_TOKEN_KEY)?.map(SecretString::from),
            user,
        })
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<AuthRecord> {
        let _guard = self.lock.lock();
        self.read_record()
    }

    fn update(&self, apply: &mut dyn FnMut(&mut AuthRecord)) -> Result<()> {
        let _guard = self.lock.lock();
        let mut record = self.read_record()?;
        apply(&mut record);

        let user_json = record.user.as_ref().map(serde_json::to_string).transpose()?;
        self.write(
            ACCESS_TOKEN_KEY,
            record.access_token.as_ref().map(|s| s.expose_secret()),
        )?;
        self.write(
            REFRESH_TOKEN_KEY,
            record.refresh_token.as_ref().map(|s| s.expose_secret()),
        )?;
        self.write(USER_DATA_KEY, user_json.as_deref())
    }

    fn mode(&self) -> CredentialsStoreMode {
        CredentialsStoreMode::Keyring
    }
}
