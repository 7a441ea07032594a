//! Database setup command.
//!
//! # Usage
//!
//! ```bash
//! shopdesk setup
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPDESK_DATABASE_URL` - `PostgreSQL` endpoint URL
//! - `SHOPDESK_DATABASE_KEY` - Service credential for the database role

use shopdesk_admin::services::{ConnectionError, SchemaBootstrap};
use thiserror::Error;

use super::{OpenError, open_manager};

/// Errors that can occur during setup.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Create the connections table if it does not exist.
pub async fn run() -> Result<SchemaBootstrap, SetupError> {
    let manager = open_manager()?;

    tracing::info!("Checking store_connections table...");
    let bootstrap = manager.ensure_schema().await?;

    match bootstrap {
        SchemaBootstrap::AlreadyPresent => {
            tracing::info!("store_connections table already exists");
        }
        SchemaBootstrap::Created => tracing::info!("store_connections table created"),
        SchemaBootstrap::Assumed => {
            tracing::warn!("Could not check for store_connections; check database access");
        }
    }

    Ok(bootstrap)
}
