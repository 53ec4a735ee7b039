//! Command execution context
//!
//! Loads configuration, opens the session file and wires up the API service
//! so handlers only deal with their own command.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use hallbook::{ApiService, Config, SessionStore};

use crate::cli::args::GlobalOptions;

/// Everything a command needs to talk to the backend.
pub struct CommandContext {
    /// API service for this run, sharing the session file with the CLI
    pub api: ApiService,
}

impl CommandContext {
    /// Create a context with configuration, session and API client.
    pub fn new(opts: &GlobalOptions) -> anyhow::Result<Self> {
        let config = load_config(opts)?;
        let session = Arc::new(open_session(opts, &config)?);
        let api = ApiService::from_config(&config, session)?;

        Ok(Self { api })
    }
}

/// Config file plus CLI overrides
pub fn load_config(opts: &GlobalOptions) -> anyhow::Result<Config> {
    let mut config = Config::load_at(opts.config_path())?;

    if let Some(url) = opts.api_url_ref() {
        config.api_url = url.to_string();
    }
    config.validate()?;

    Ok(config)
}

/// Resolve the session file: CLI flag, then config, then default location
pub fn session_path(opts: &GlobalOptions, config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(path) = opts.session_path() {
        return Ok(path.to_path_buf());
    }
    if let Some(ref path) = config.session_path {
        return Ok(path.clone());
    }
    Ok(SessionStore::default_path()?)
}

pub fn open_session(opts: &GlobalOptions, config: &Config) -> anyhow::Result<SessionStore> {
    let path = session_path(opts, config)?;
    let store = SessionStore::open_at(path, config.resolved_login_url()).with_redirect(|url| {
        eprintln!(
            "{} Session ended. Sign in again at {}",
            "!".yellow(),
            url.cyan()
        );
    });
    Ok(store)
}
