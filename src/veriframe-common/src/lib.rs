//! Common utilities shared across Veriframe crates.
//!
//! - `dirs` - application home (`~/.veriframe`, `VERIFRAME_HOME`)
//! - `config` - `config.toml` loading and the resolved [`ApiConfig`]
//! - `fs` - atomic writes with restrictive permissions
//! - `http_client` - `reqwest::Client` factory

pub mod config;
pub mod dirs;
pub mod fs;
pub mod http_client;

pub use config::{
    API_URL_ENV_VAR, ApiConfig, ConfigError, ConfigToml, CredentialsStoreMode, DEFAULT_API_URL,
    load_config,
};
pub use dirs::{AppDirs, HOME_ENV_VAR, get_app_dirs};
pub use fs::{atomic_write, set_file_permissions};
pub use http_client::{USER_AGENT, create_client, create_client_builder};
