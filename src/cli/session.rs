//! Session commands

use colored::Colorize;
use hallbook::{AuthProvider, Session};

use crate::cli::args::GlobalOptions;
use crate::cli::context::{load_config, open_session};

/// Store a token obtained from the backend's sign-in flow
pub fn set(
    opts: &GlobalOptions,
    token: String,
    name: Option<String>,
    role: Option<String>,
) -> anyhow::Result<()> {
    let config = load_config(opts)?;
    let store = open_session(opts, &config)?;

    let mut session = Session::new(token);
    session.name = name;
    session.role = role;
    store.store(&session)?;

    println!(
        "{} Session stored at {}",
        "✓".green(),
        store.path().display().to_string().cyan()
    );
    Ok(())
}

/// End the session the same way an expired token does
pub fn clear(opts: &GlobalOptions) -> anyhow::Result<()> {
    let config = load_config(opts)?;
    let store = open_session(opts, &config)?;

    if store.load()?.is_none() {
        println!("{} No active session", "○".dimmed());
        return Ok(());
    }

    store.teardown();
    Ok(())
}
