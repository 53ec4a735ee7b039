//! hallbook CLI - talk to the hall booking backend through the cached API client

use clap::Parser;

mod cli;
mod output;

use cli::args::GlobalOptions;
use cli::{Cli, Commands, SessionCommands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "hallbook=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Get { endpoint } => cli::request::get(&opts, &endpoint).await,
        Commands::Send {
            method,
            endpoint,
            data,
        } => cli::request::send(&opts, &method, &endpoint, data.as_deref()).await,
        Commands::List { resource } => cli::request::list(&opts, resource).await,
        Commands::Approvals { filter } => cli::request::approvals(&opts, filter).await,
        Commands::Approve { booking_id } => cli::request::approve(&opts, &booking_id).await,
        Commands::Reject { booking_id, reason } => {
            cli::request::reject(&opts, &booking_id, reason.as_deref()).await
        }
        Commands::Forward { booking_id } => cli::request::forward(&opts, &booking_id).await,
        Commands::Status => cli::status::run(&opts),
        Commands::Session(cmd) => match cmd {
            SessionCommands::Set { token, name, role } => {
                cli::session::set(&opts, token, name, role)
            }
            SessionCommands::Clear => cli::session::clear(&opts),
        },
        Commands::Logout => cli::session::clear(&opts),
        Commands::Version => {
            println!("hallbook version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
