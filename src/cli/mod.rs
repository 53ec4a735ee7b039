//! CLI command definitions and handlers

use clap::{Parser, Subcommand};
use hallbook::{ApprovalFilter, Resource};

pub mod args;
pub mod context;
pub mod request;
pub mod session;
pub mod status;

pub use context::CommandContext;

/// hallbook - cached API client for the hall booking backend
#[derive(Parser, Debug)]
#[command(name = "hallbook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Override config file location
    #[arg(long, global = true, env = "HALLBOOK_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Override the backend base URL
    #[arg(long, global = true, env = "HALLBOOK_API_URL", hide_env = true)]
    pub api_url: Option<String>,

    /// Override session file location
    #[arg(long, global = true, env = "HALLBOOK_SESSION", hide_env = true)]
    pub session: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "HALLBOOK_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET an endpoint, e.g. `api/hall/all-hall`
    Get {
        endpoint: String,
    },

    /// Send a request with any method
    Send {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,

        endpoint: String,

        /// JSON request body
        #[arg(long, short = 'd')]
        data: Option<String>,
    },

    /// List a resource (hall, employee, school, department, booking)
    List {
        resource: Resource,
    },

    /// Show the booking approval queue
    Approvals {
        /// Queue to show (all, internal, forward, external)
        #[arg(long, short = 'f', default_value = "all")]
        filter: ApprovalFilter,
    },

    /// Approve a booking request
    Approve {
        booking_id: String,
    },

    /// Reject a booking request
    Reject {
        booking_id: String,

        /// Reason shown to the requester
        #[arg(long, short = 'r')]
        reason: Option<String>,
    },

    /// Forward a booking request to the next approver
    Forward {
        booking_id: String,
    },

    /// Show configuration and session status
    Status,

    /// Manage the stored session
    #[command(subcommand)]
    Session(SessionCommands),

    /// End the current session
    Logout,

    /// Display version information
    Version,
}

/// Session management subcommands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Store a bearer token issued by the backend
    Set {
        token: String,

        /// Display name of the signed-in user
        #[arg(long)]
        name: Option<String>,

        /// Role of the signed-in user
        #[arg(long)]
        role: Option<String>,
    },

    /// Remove the stored session
    Clear,
}
