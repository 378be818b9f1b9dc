//! CLI module - Command-line interface for BetaDesk
//!
//! Operator commands run against the same local store and remote replica
//! as the server.

mod commands;

use clap::{Parser, Subcommand};

/// BetaDesk - accounts and ticketing for a closed beta
#[derive(Parser)]
#[command(name = "betadesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web API with the background scheduler (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create the primary admin account
    Setup {
        username: String,
        display_name: String,
        /// 4 to 6 digits
        #[arg(long)]
        password: String,
    },

    /// Verify credentials and remember the username
    Login {
        /// Defaults to the last username that logged in
        username: Option<String>,
        #[arg(long)]
        password: String,
    },

    /// List accounts
    #[command(alias = "ls")]
    Users,

    /// Show pending and recently accepted account requests
    Requests,

    /// Show the activity log
    Logs {
        /// login, account, game, bug, suggestion, notification or system
        #[arg(long)]
        category: Option<String>,
    },

    /// Wipe the local store and reseed defaults. The remote is untouched.
    ResetLocal,
}

pub use commands::*;
