//! Storefinder CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sf-cli migrate
//!
//! # Create a user (password read from SF_USER_PASSWORD)
//! SF_USER_PASSWORD=... sf-cli user create -e wes@example.com -n "Wes"
//!
//! # Load sample users and stores, replacing existing stores
//! sf-cli seed data/sample.yaml --clear
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFINDER_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sf-cli")]
#[command(author, version, about = "Storefinder CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Load users and stores from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,

        /// Delete every existing store first
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user with the password in `SF_USER_PASSWORD`
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { email, name } => {
                commands::user::create_user(&email, &name).await?;
            }
        },
        Commands::Seed { file, clear } => commands::seed::run(&file, clear).await?,
    }
    Ok(())
}
