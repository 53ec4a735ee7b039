//! Status command implementation

use colored::Colorize;
use hallbook::{Config, RetryPolicy};

use crate::cli::args::GlobalOptions;
use crate::cli::context::{load_config, open_session};

/// Display configuration and session status
pub fn run(opts: &GlobalOptions) -> anyhow::Result<()> {
    println!("{}\n", "hallbook Status".bold());

    match opts.config_path() {
        Some(path) => println!("Config file: {}", path.display().to_string().cyan()),
        None => match Config::default_path() {
            Ok(path) if path.exists() => {
                println!("Config file: {}", path.display().to_string().cyan())
            }
            _ => println!("Config file: {}", "(defaults)".dimmed()),
        },
    }

    let config = load_config(opts)?;
    println!("API URL: {}", config.api_url.cyan());
    println!("Login endpoint: {}", config.login_endpoint);

    let policy = RetryPolicy::from(&config.retry);
    println!(
        "Retries: {} attempts, backoff from {:?}",
        policy.max_attempts, policy.base_delay
    );
    println!();

    let store = open_session(opts, &config)?;
    println!("Session file: {}", store.path().display().to_string().cyan());

    match store.load() {
        Ok(Some(session)) => {
            println!("{} Signed in", "✓".green());
            if let Some(ref name) = session.name {
                println!("  User: {}", name);
            }
            if let Some(ref role) = session.role {
                println!("  Role: {}", role);
            }
            println!(
                "  Stored: {}",
                session
                    .stored_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            );

            if let Some(expires) = session.expires_at() {
                let remaining = expires.signed_duration_since(chrono::Utc::now());
                if remaining.num_seconds() <= 0 {
                    println!("{} Token expired", "⚠".yellow());
                } else {
                    println!(
                        "  Token expires in {}h {}m",
                        remaining.num_hours(),
                        remaining.num_minutes() % 60
                    );
                }
            }
        }
        Ok(None) => {
            println!("{} Not signed in", "✗".red());
            println!(
                "  → Sign in at {} then run 'hallbook session set <TOKEN>'",
                config.resolved_login_url()
            );
        }
        Err(e) => {
            println!("{} Session file unreadable: {}", "⚠".yellow(), e);
        }
    }

    Ok(())
}
