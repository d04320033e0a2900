//! Application configuration management.
//!
//! Configuration is stored at `~/.config/pms-client/config.json`. A few
//! fields can be overridden from the environment, which is how deployments
//! point the client at a different backend.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::auth::TokenStorage;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "pms-client";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Where password reset emails send the user
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173/";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 240;

pub const ENV_API_URL: &str = "PMS_API_URL";
pub const ENV_FRONTEND_URL: &str = "PMS_FRONTEND_URL";
pub const ENV_TOKEN_STORAGE: &str = "PMS_TOKEN_STORAGE";
pub const ENV_PASSPHRASE: &str = "PMS_PASSPHRASE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub frontend_url: String,
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub token_storage: TokenStorage,
    pub log_to_file: bool,
    pub last_email: Option<String>,
    /// Passphrase for the encrypted token store; only ever read from the environment
    #[serde(skip)]
    pub passphrase: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_storage: TokenStorage::default(),
            log_to_file: false,
            last_email: None,
            passphrase: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(url) = get(ENV_FRONTEND_URL) {
            self.frontend_url = url;
        }
        if let Some(kind) = get(ENV_TOKEN_STORAGE) {
            match kind.parse() {
                Ok(storage) => self.token_storage = storage,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_TOKEN_STORAGE),
            }
        }
        if let Some(passphrase) = get(ENV_PASSPHRASE) {
            self.passphrase = Some(passphrase);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Page the reset email links back to
    pub fn password_reset_redirect(&self) -> String {
        format!("{}/reset-password/", self.frontend_url.trim_end_matches('/'))
    }
}
