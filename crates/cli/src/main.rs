//! Shopdesk CLI - Database setup and store connection tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the store_connections table if it does not exist
//! shopdesk setup
//!
//! # Show the connected store (no credentials are printed)
//! shopdesk connection show
//!
//! # Save or replace the store credentials
//! shopdesk connection save \
//!     --store-url my-shop.myshopify.com \
//!     --api-key KEY --api-secret SECRET --access-token TOKEN
//! ```
//!
//! # Commands
//!
//! - `setup` - Bootstrap the database schema
//! - `connection show` - Print connection status
//! - `connection save` - Validate and store credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser)]
#[command(name = "shopdesk")]
#[command(author, version, about = "Shopdesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store_connections table if it does not exist
    Setup,
    /// Manage the Shopify store connection
    Connection {
        #[command(subcommand)]
        action: ConnectionAction,
    },
}

#[derive(Subcommand)]
enum ConnectionAction {
    /// Show the connected store
    Show,
    /// Save the store credentials, replacing any existing ones
    Save {
        /// Store URL, e.g. `my-shop.myshopify.com`
        #[arg(long)]
        store_url: String,

        /// Admin API key
        #[arg(long)]
        api_key: String,

        /// Admin API secret
        #[arg(long)]
        api_secret: String,

        /// Admin API access token
        #[arg(long)]
        access_token: String,
    },
}

#[tokio::main]
async fn main() {
    // Commands report their results at info level
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Setup => {
            commands::setup::run().await?;
        }
        Commands::Connection { action } => match action {
            ConnectionAction::Show => commands::connection::show().await?,
            ConnectionAction::Save {
                store_url,
                api_key,
                api_secret,
                access_token,
            } => {
                commands::connection::save(&store_url, &api_key, &api_secret, &access_token)
                    .await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_save_requires_all_credentials() {
        let result = Cli::try_parse_from([
            "shopdesk",
            "connection",
            "save",
            "--store-url",
            "shop.myshopify.com",
            "--api-key",
            "k",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_filter_shows_info() {
        let filter = EnvFilter::new(DEFAULT_LOG_FILTER);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }
}
