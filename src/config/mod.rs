//! Configuration management for hallbook

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Endpoint that may be called without a session token
pub const DEFAULT_LOGIN_ENDPOINT: &str = "api/auth/login";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL, endpoints are joined onto it
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Login endpoint (exempt from the session requirement)
    #[serde(default = "default_login_endpoint")]
    pub login_endpoint: String,

    /// Where teardown sends the user to sign in again
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,

    /// Session file override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_path: Option<PathBuf>,

    /// Retry behaviour for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per logical request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each further attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_login_endpoint() -> String {
    DEFAULT_LOGIN_ENDPOINT.to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            login_endpoint: default_login_endpoint(),
            login_url: None,
            session_path: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path (~/.hallbook/config.yaml)
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".hallbook").join("config.yaml"))
    }

    /// Load configuration from an explicit path, or the default location.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load_at(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    log::debug!("No config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Reject settings the client cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_url must not be empty".to_string()).into());
        }
        if self.retry.max_attempts == 0 {
            return Err(
                ConfigError::Invalid("retry.max_attempts must be at least 1".to_string()).into(),
            );
        }
        Ok(())
    }

    /// Login page that teardown redirects to
    pub fn resolved_login_url(&self) -> String {
        self.login_url
            .clone()
            .unwrap_or_else(|| format!("{}/login", self.api_url.trim_end_matches('/')))
    }
}
