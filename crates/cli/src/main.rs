//! Laundry CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending database migrations
//! laundry-cli migrate
//!
//! # Create a staff account
//! laundry-cli admin create -u alice -p 's3cret!'
//!
//! # Disable (or re-enable) an account
//! laundry-cli admin set-active -u alice --active false
//!
//! # Delete expired sessions
//! laundry-cli sessions purge
//! ```
//!
//! All commands read the database URL from `LAUNDRY_DATABASE_URL` (or
//! `DATABASE_URL`), loading `.env` when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "laundry-cli")]
#[command(author, version, about = "Laundry backend CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Manage staff accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage login sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a local account with a password
    Create {
        /// Login name (at least 3 characters)
        #[arg(short, long)]
        username: String,

        /// Password (at least 6 characters)
        #[arg(short, long, env = "LAUNDRY_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Activate or deactivate an account
    SetActive {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Whether the account may log in
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Delete sessions past their expiry
    Purge,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { username, password } => {
                commands::admin::create_user(&username, &password).await?;
            }
            AdminAction::SetActive { username, active } => {
                commands::admin::set_active(&username, active).await?;
            }
        },
        Commands::Sessions { action } => match action {
            SessionAction::Purge => {
                commands::sessions::purge().await?;
            }
        },
    }
    Ok(())
}
