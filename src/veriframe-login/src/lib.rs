//! Veriframe Login - session credential storage.
//!
//! Provides the [`TokenStore`] contract shared by the session manager and
//! the HTTP client's refresh path, plus three backends:
//! - JSON file in the application home (0600, atomic writes)
//! - OS keychain
//! - process memory
//!
//! Tokens are held as `secrecy::SecretString` so they never show up in
//! `Debug` output.

pub mod constants;
pub mod types;

mod file;
mod keyring;
mod memory;
mod store;

pub use constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY};
pub use types::{AuthRecord, Role, TokenPair, UserProfile};

pub use file::FileTokenStore;
pub use keyring::KeyringTokenStore;
pub use memory::MemoryTokenStore;
pub use store::{Result, StoreError, TokenStore, open_token_store};

pub use veriframe_common::CredentialsStoreMode;

// Re-exported so callers can build tokens without a direct secrecy dependency
pub use secrecy::{ExposeSecret, SecretString};
