//! Free Ads CLI - Database migrations and development tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! fa-cli migrate
//!
//! # Create a user with one classified ad
//! fa-cli seed --username ana --title "Mountain bike"
//!
//! # Show the profile of the user a token belongs to
//! fa-cli me --api-url http://localhost:5000 --token "$TOKEN"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert a user and an ad to attach photos to
//! - `me` - Resolve the current user through the API

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;
mod resolver;

#[derive(Parser)]
#[command(name = "fa-cli")]
#[command(author, version, about = "Free Ads CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Insert a user owning one classified ad
    Seed {
        /// Username; an existing user is reused
        #[arg(short, long)]
        username: String,

        /// Title of the classified ad
        #[arg(short, long)]
        title: String,
    },
    /// Show the profile of the user a token belongs to
    Me {
        /// Base URL of the API
        #[arg(long, default_value = "http://localhost:5000")]
        api_url: String,

        /// Bearer token
        #[arg(long, env = "FREE_ADS_TOKEN")]
        token: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fa_cli=info".into()),
        )
        .init();

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
        Commands::Seed { username, title } => {
            commands::seed::user_with_ad(&username, &title).await?;
        }
        Commands::Me { api_url, token } => commands::me::show(&api_url, &token).await?,
    }
    Ok(())
}
