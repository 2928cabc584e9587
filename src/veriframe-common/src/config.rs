//! Configuration loading.
//!
//! `config.toml` in the application home is optional; every field has a
//! default. Resolution order, lowest to highest priority:
//! defaults, config file, environment (`VERIFRAME_API_URL`), explicit
//! overrides from the caller (CLI flags).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dirs::AppDirs;

/// Default API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Environment variable for the API base URL.
pub const API_URL_ENV_VAR: &str = "VERIFRAME_API_URL";

/// Default keyring service name.
pub const DEFAULT_KEYRING_SERVICE: &str = "veriframe";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_EXPIRY_GRACE_MS: u64 = 100;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where credentials are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialsStoreMode {
    /// JSON file in the application home (default).
    #[default]
    File,
    /// OS keychain.
    Keyring,
    /// Process memory only; nothing survives exit.
    Memory,
}

impl std::fmt::Display for CredentialsStoreMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Keyring => write!(f, "keyring"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigToml {
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    /// Delay between a failed refresh and the session-expired notification.
    pub expiry_grace_ms: Option<u64>,
    /// Query parameters dropped from a request before it is retried.
    pub cache_busting_params: Option<Vec<String>>,
    pub credentials_store: Option<CredentialsStoreMode>,
    pub keyring_service: Option<String>,
}

impl ConfigToml {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load `config.toml` from the application home. A missing file yields defaults.
pub fn load_config(dirs: &AppDirs) -> Result<ConfigToml> {
    let path = dirs.config_file();
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(ConfigToml::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "Loaded config file");
    ConfigToml::from_toml_str(&content, &path)
}

/// Resolved runtime configuration for the API client.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Base URL without trailing slash.
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub expiry_grace: Duration,
    pub cache_busting_params: Vec<String>,
    pub credentials_store: CredentialsStoreMode,
    pub keyring_service: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            expiry_grace: Duration::from_millis(DEFAULT_EXPIRY_GRACE_MS),
            cache_busting_params: vec!["t".to_string()],
            credentials_store: CredentialsStoreMode::default(),
            keyring_service: DEFAULT_KEYRING_SERVICE.to_string(),
        }
    }
}

impl ApiConfig {
    /// Config for the given base URL with all other fields defaulted.
    pub fn for_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            ..Self::default()
        })
    }

    /// Build from the file layer on top of defaults.
    pub fn from_toml(cfg: &ConfigToml) -> Result<Self> {
        let defaults = Self::default();
        let base_url = match cfg.api_url.as_deref() {
            Some(url) => normalize_base_url(url)?,
            None => defaults.base_url,
        };

        Ok(Self {
            base_url,
            request_timeout: cfg
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            connect_timeout: cfg
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            expiry_grace: cfg
                .expiry_grace_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.expiry_grace),
            cache_busting_params: cfg
                .cache_busting_params
                .clone()
                .unwrap_or(defaults.cache_busting_params),
            credentials_store: cfg.credentials_store.unwrap_or_default(),
            keyring_service: cfg
                .keyring_service
                .clone()
                .unwrap_or(defaults.keyring_service),
        })
    }

    /// Apply environment overrides using the given lookup.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV_VAR).filter(|u| !u.is_empty()) {
            debug!(url = %url, "Using {API_URL_ENV_VAR}");
            self.base_url = normalize_base_url(&url)?;
        }
        Ok(self)
    }

    /// Apply environment overrides from the process environment.
    pub fn with_process_env(self) -> Result<Self> {
        self.with_env(|key| std::env::var(key).ok())
    }

    /// Override the base URL (highest priority).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = normalize_base_url(base_url)?;
        Ok(self)
    }

    /// Join an API path (`/api/...`) onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let cfg = ApiConfig::from_toml(&ConfigToml::default()).unwrap();
        assert_eq!(cfg, ApiConfig::default());
        assert_eq!(cfg.base_url, "http://localhost:8000");
        assert_eq!(cfg.cache_busting_params, vec!["t".to_string()]);
        assert_eq!(cfg.expiry_grace, Duration::from_millis(100));
    }

    #[test]
    fn test_parse_full_file() {
        let toml = r#"
            api_url = "https://api.example.com/"
            request_timeout_secs = 10
            connect_timeout_secs = 2
            expiry_grace_ms = 250
            cache_busting_params = ["t", "_"]
            credentials_store = "keyring"
            keyring_service = "veriframe-test"
        "#;
        let file = ConfigToml::from_toml_str(toml, Path::new("config.toml")).unwrap();
        let cfg = ApiConfig::from_toml(&file).unwrap();

        assert_eq!(cfg.base_url, "https://api.example.com");
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(2));
        assert_eq!(cfg.expiry_grace, Duration::from_millis(250));
        assert_eq!(cfg.cache_busting_params, vec!["t", "_"]);
        assert_eq!(cfg.credentials_store, CredentialsStoreMode::Keyring);
        assert_eq!(cfg.keyring_service, "veriframe-test");
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ConfigToml::from_toml_str("api_url = [", Path::new("/x/config.toml")).unwrap_err();
        assert!(err.to_string().contains("/x/config.toml"));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigToml {
            api_url: Some("http://file.example".to_string()),
            ..Default::default()
        };
        let cfg = ApiConfig::from_toml(&file)
            .unwrap()
            .with_env(|key| (key == API_URL_ENV_VAR).then(|| "http://env.example/".to_string()))
            .unwrap();
        assert_eq!(cfg.base_url, "http://env.example");

        let cfg = cfg.with_base_url("http://flag.example").unwrap();
        assert_eq!(cfg.base_url, "http://flag.example");
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let cfg = ApiConfig::default()
            .with_env(|_| Some(String::new()))
            .unwrap();
        assert_eq!(cfg.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(ApiConfig::for_base_url("not a url").is_err());
        assert!(ApiConfig::for_base_url("ftp://example.com").is_err());
    }

    #[test]
    fn test_endpoint_join() {
        let cfg = ApiConfig::for_base_url("http://host:8000/prefix/").unwrap();
        assert_eq!(
            cfg.endpoint("/api/auth/login/"),
            "http://host:8000/prefix/api/auth/login/"
        );
        assert_eq!(cfg.endpoint("api/x/"), "http://host:8000/prefix/api/x/");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = AppDirs::with_home(dir.path());
        assert_eq!(load_config(&dirs).unwrap(), ConfigToml::default());
    }

    #[test]
    fn test_load_from_home() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = AppDirs::with_home(dir.path());
        std::fs::write(dirs.config_file(), "credentials_store = \"memory\"\n").unwrap();
        let cfg = load_config(&dirs).unwrap();
        assert_eq!(cfg.credentials_store, Some(CredentialsStoreMode::Memory));
    }
}
