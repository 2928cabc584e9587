//! Application directories for Veriframe.
//!
//! Everything lives under a single home directory:
//! - Linux/macOS: `~/.veriframe`
//! - Windows: `%APPDATA%\veriframe`
//!
//! Can be overridden with the `VERIFRAME_HOME` environment variable.

use std::path::{Path, PathBuf};

/// Application name for directory paths
pub const APP_NAME: &str = "veriframe";

/// Home directory name on Linux/macOS
pub const HOME_DIR_NAME: &str = ".veriframe";

/// Environment variable overriding the home directory.
pub const HOME_ENV_VAR: &str = "VERIFRAME_HOME";

/// Application directories structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// Home directory holding config and credentials
    pub home: PathBuf,
}

impl AppDirs {
    /// Resolve application directories, respecting `VERIFRAME_HOME`.
    pub fn new() -> Option<Self> {
        Self::resolve(std::env::var(HOME_ENV_VAR).ok().as_deref())
    }

    /// Use an explicit home directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn resolve(override_home: Option<&str>) -> Option<Self> {
        if let Some(home) = override_home.filter(|h| !h.is_empty()) {
            let home = PathBuf::from(home);
            // Relative overrides are resolved against the cwd so files never land somewhere surprising
            let home = if home.is_relative() {
                match std::env::current_dir() {
                    Ok(cwd) => cwd.join(&home),
                    Err(_) => default_home()?,
                }
            } else {
                home
            };
            return Some(Self { home });
        }

        Some(Self {
            home: default_home()?,
        })
    }

    /// Path of `config.toml`.
    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Path of the file-backed credential store.
    pub fn auth_file(&self) -> PathBuf {
        self.home.join("auth.json")
    }

    /// Home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Ensure the home directory exists (0700 on Unix).
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if !self.home.exists() {
            std::fs::create_dir_all(&self.home)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(&self.home, std::fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn default_home() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_NAME))
}

#[cfg(not(target_os = "windows"))]
fn default_home() -> Option<PathBuf> {
    Some(dirs::home_dir()?.join(HOME_DIR_NAME))
}

/// Get application directories (convenience function)
pub fn get_app_dirs() -> Option<AppDirs> {
    AppDirs::new()
}
