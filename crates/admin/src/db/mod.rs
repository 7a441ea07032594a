//! Database access for the store connection record.
//!
//! # Tables
//!
//! - `store_connections` - Shopify credentials, one row per connection slot
//!
//! # Schema bootstrap
//!
//! There is no migration step. The table is created lazily on first use by
//! [`ConnectionStore::create_schema`], which is safe to call repeatedly.
//! Requires `PostgreSQL` 13+ (`gen_random_uuid()` is built in).
//!
//! # Backends
//!
//! - [`PgConnectionStore`] - `PostgreSQL` via `sqlx`
//! - [`MemoryConnectionStore`] - in-process store for tests

pub mod connections;
pub mod memory;

use std::str::FromStr;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use shopdesk_core::{
    ConnectionCredentials, ConnectionSlot, SaveOutcome, SchemaState, StoreConnection,
};
use sqlx::PgPool;
use sqlx::error::DatabaseError as _;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use thiserror::Error;

use crate::config::DatabaseConfig;

pub use connections::PgConnectionStore;
pub use memory::MemoryConnectionStore;

/// `PostgreSQL` SQLSTATE for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `store_connections` table does not exist.
    #[error("store_connections table does not exist")]
    SchemaMissing,

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let undefined_table = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNDEFINED_TABLE);

        if undefined_table {
            Self::SchemaMissing
        } else {
            Self::Database(err)
        }
    }
}

/// Errors from building the database gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Endpoint or service credential was empty.
    #[error(
        "Cannot initialize database gateway. SHOPDESK_DATABASE_URL and SHOPDESK_DATABASE_KEY must be set."
    )]
    MissingSettings,

    /// The endpoint URL could not be parsed.
    #[error("invalid database URL: {0}")]
    InvalidUrl(#[source] sqlx::Error),
}

/// Storage for store connection records.
///
/// Every method is a single round trip to the backing store; callers hold no
/// state between calls.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Check whether the connections table exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the check itself could not run.
    async fn check_schema(&self) -> Result<SchemaState, StoreError>;

    /// Create the connections table. A no-op if it already exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the table could not be created.
    async fn create_schema(&self) -> Result<(), StoreError>;

    /// Fetch the record stored under `slot`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SchemaMissing` if the table is gone and
    /// `StoreError::Database` for any other failure.
    async fn fetch(&self, slot: &ConnectionSlot) -> Result<Option<StoreConnection>, StoreError>;

    /// Insert or update the record stored under `slot` in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    async fn upsert(
        &self,
        slot: &ConnectionSlot,
        credentials: &ConnectionCredentials,
    ) -> Result<(StoreConnection, SaveOutcome), StoreError>;

    /// Check that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be reached.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Handle factory for the backing `PostgreSQL` database.
///
/// Construction is all-or-nothing: either both settings are present and the
/// URL parses, or no gateway exists. The pool connects lazily, so building a
/// gateway never blocks on the network.
#[derive(Debug, Clone)]
pub struct DatabaseGateway {
    pool: PgPool,
}

impl DatabaseGateway {
    /// Build a gateway from explicit configuration.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::MissingSettings` if the endpoint or service
    /// credential is empty, and `GatewayError::InvalidUrl` if the endpoint
    /// does not parse.
    pub fn new(config: &DatabaseConfig) -> Result<Self, GatewayError> {
        let url = config.url.expose_secret();
        let service_key = config.service_key.expose_secret();
        if url.trim().is_empty() || service_key.trim().is_empty() {
            return Err(GatewayError::MissingSettings);
        }

        let options = PgConnectOptions::from_str(url)
            .map_err(GatewayError::InvalidUrl)?
            .password(service_key);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Returns a handle to the database.
    ///
    /// The handle is a cheap clone of the shared pool.
    #[must_use]
    pub fn connect(&self) -> PgPool {
        self.pool.clone()
    }
}
