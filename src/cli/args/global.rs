//! Global CLI options shared across all commands
//!
//! Precedence is: CLI flag > environment variable > config file > default.
//! This struct captures the CLI/env layer; config file values are merged in
//! `CommandContext`.

use std::path::Path;

use crate::cli::Cli;

/// Global CLI options passed to all command handlers.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Custom config file path (defaults to ~/.hallbook/config.yaml)
    pub config: Option<String>,

    /// Backend base URL override
    pub api_url: Option<String>,

    /// Custom session file path (defaults to ~/.hallbook/session.yaml)
    pub session: Option<String>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            api_url: cli.api_url.clone(),
            session: cli.session.clone(),
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref().map(Path::new)
    }

    pub fn api_url_ref(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    pub fn session_path(&self) -> Option<&Path> {
        self.session.as_deref().map(Path::new)
    }
}
