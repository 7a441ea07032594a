//! CLI command implementations.

pub mod connection;
pub mod setup;

use shopdesk_admin::config::{AdminConfig, ConfigError};
use shopdesk_admin::db::{DatabaseGateway, GatewayError, PgConnectionStore};
use shopdesk_admin::services::ConnectionManager;
use std::sync::Arc;
use thiserror::Error;

/// Errors from opening the connection store.
#[derive(Debug, Error)]
pub enum OpenError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database gateway could not be built.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Build a connection manager from the environment.
///
/// Reads the same variables as the admin server, including `.env`.
pub fn open_manager() -> Result<ConnectionManager, OpenError> {
    let config = AdminConfig::from_env()?;
    for warning in config.security_warnings() {
        tracing::warn!("{warning}");
    }
    let gateway = DatabaseGateway::new(&config.database)?;
    let store = Arc::new(PgConnectionStore::new(gateway.connect()));

    tracing::debug!(slot = %config.connection_slot, "Opened connection store");
    Ok(ConnectionManager::new(store, config.connection_slot))
}
