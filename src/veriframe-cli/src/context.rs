//! Wiring shared by all commands: directories, configuration, token store,
//! API client and session.

use std::sync::Arc;

use anyhow::{Context, Result};
use veriframe_client::{ApiClient, SessionManager};
use veriframe_common::{
    ApiConfig, AppDirs, ConfigToml, CredentialsStoreMode, get_app_dirs, load_config,
};
use veriframe_login::open_token_store;

use crate::cli::GlobalArgs;

pub struct AppContext {
    pub dirs: AppDirs,
    pub session: Arc<SessionManager>,
    pub json: bool,
}

impl AppContext {
    /// Resolve configuration and restore the stored session.
    pub async fn load(global: &GlobalArgs) -> Result<Self> {
        let dirs = match &global.home {
            Some(home) => AppDirs::with_home(home),
            None => get_app_dirs().context("Could not determine the home directory")?,
        };

        let file = load_config(&dirs)?;
        let config = resolve_config(&file, global, |key| std::env::var(key).ok())?;
        tracing::debug!(
            base_url = %config.base_url,
            store = %config.credentials_store,
            "Resolved configuration"
        );

        if config.credentials_store == CredentialsStoreMode::File {
            dirs.ensure_dirs().with_context(|| {
                format!("Failed to create {}", dirs.home().display())
            })?;
        }

        let store = open_token_store(&config, &dirs);
        let client = ApiClient::new(config, store).context("Failed to build HTTP client")?;
        let session = Arc::new(SessionManager::new(client));
        session
            .bootstrap()
            .await
            .context("Failed to read stored credentials")?;

        Ok(Self {
            dirs,
            session,
            json: global.json,
        })
    }

    pub fn client(&self) -> &ApiClient {
        self.session.client()
    }
}

/// Defaults < config file < environment < command-line flags.
pub fn resolve_config<F>(file: &ConfigToml, global: &GlobalArgs, env: F) -> Result<ApiConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ApiConfig::from_toml(file)?.with_env(env)?;
    if let Some(url) = &global.api_url {
        config = config.with_base_url(url)?;
    }
    if let Some(store) = global.store {
        config.credentials_store = store.into();
    }
    Ok(config)
}
