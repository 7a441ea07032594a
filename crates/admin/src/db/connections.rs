//! `PostgreSQL` store for the Shopify connection record.
//!
//! All writes go through a single `INSERT .. ON CONFLICT (slot) DO UPDATE`
//! statement. The `UNIQUE` constraint on `slot` makes concurrent saves
//! converge on one row instead of racing a separate existence check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use shopdesk_core::{
    ConnectionCredentials, ConnectionId, ConnectionSlot, SaveOutcome, SchemaState,
    StoreConnection, StoreUrl,
};
use sqlx::PgPool;
use sqlx::error::DatabaseError as _;
use tracing::instrument;

use super::{ConnectionStore, StoreError};

/// SQLSTATEs raised when two sessions race `CREATE TABLE IF NOT EXISTS`.
const DUPLICATE_TABLE: &str = "42P07";
const UNIQUE_VIOLATION: &str = "23505";

const CREATE_TABLE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS store_connections (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    slot TEXT NOT NULL UNIQUE DEFAULT 'default',
    store_url TEXT NOT NULL,
    api_key TEXT NOT NULL,
    api_secret TEXT NOT NULL,
    access_token TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
";

// =============================================================================
// Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` queries.
#[derive(sqlx::FromRow)]
struct StoreConnectionRow {
    id: ConnectionId,
    store_url: StoreUrl,
    api_key: String,
    api_secret: String,
    access_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoreConnectionRow {
    fn into_connection(self, slot: &ConnectionSlot) -> StoreConnection {
        StoreConnection {
            id: self.id,
            slot: slot.clone(),
            store_url: self.store_url,
            api_key: self.api_key,
            api_secret: SecretString::from(self.api_secret),
            access_token: SecretString::from(self.access_token),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Row returned by the upsert, with the insert/update flag.
#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    connection: StoreConnectionRow,
    inserted: bool,
}

// =============================================================================
// Store
// =============================================================================

/// `PostgreSQL`-backed connection store.
#[derive(Debug, Clone)]
pub struct PgConnectionStore {
    pool: PgPool,
}

impl PgConnectionStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectionStore for PgConnectionStore {
    #[instrument(skip(self))]
    async fn check_schema(&self) -> Result<SchemaState, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT to_regclass('store_connections') IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(if exists {
            SchemaState::Exists
        } else {
            SchemaState::Missing
        })
    }

    #[instrument(skip(self))]
    async fn create_schema(&self) -> Result<(), StoreError> {
        match sqlx::query(CREATE_TABLE_SQL).execute(&self.pool).await {
            Ok(_) => Ok(()),
            // Another session created the table between our check and this statement
            Err(err) if lost_create_race(&err) => {
                tracing::debug!("store_connections created concurrently");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self), fields(slot = %slot))]
    async fn fetch(&self, slot: &ConnectionSlot) -> Result<Option<StoreConnection>, StoreError> {
        let row = sqlx::query_as::<_, StoreConnectionRow>(
            r"
            SELECT id, store_url, api_key, api_secret, access_token, created_at, updated_at
            FROM store_connections
            WHERE slot = $1
            LIMIT 1
            ",
        )
        .bind(slot.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_connection(slot)))
    }

    #[instrument(skip(self, credentials), fields(slot = %slot, store_url = %credentials.store_url))]
    async fn upsert(
        &self,
        slot: &ConnectionSlot,
        credentials: &ConnectionCredentials,
    ) -> Result<(StoreConnection, SaveOutcome), StoreError> {
        // xmax is 0 only for rows this statement inserted
        let row = sqlx::query_as::<_, UpsertRow>(
            r"
            INSERT INTO store_connections (slot, store_url, api_key, api_secret, access_token)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slot) DO UPDATE SET
                store_url = EXCLUDED.store_url,
                api_key = EXCLUDED.api_key,
                api_secret = EXCLUDED.api_secret,
                access_token = EXCLUDED.access_token,
                updated_at = NOW()
            RETURNING
                id, store_url, api_key, api_secret, access_token, created_at, updated_at,
                (xmax = 0) AS inserted
            ",
        )
        .bind(slot.as_str())
        .bind(&credentials.store_url)
        .bind(&credentials.api_key)
        .bind(credentials.api_secret.expose_secret())
        .bind(credentials.access_token.expose_secret())
        .fetch_one(&self.pool)
        .await?;

        let outcome = if row.inserted {
            SaveOutcome::Created
        } else {
            SaveOutcome::Updated
        };

        Ok((row.connection.into_connection(slot), outcome))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Whether a `CREATE TABLE IF NOT EXISTS` failed only because a concurrent
/// session created the same table.
fn lost_create_race(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == DUPLICATE_TABLE || code == UNIQUE_VIOLATION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_table_is_idempotent_ddl() {
        assert!(CREATE_TABLE_SQL.contains("IF NOT EXISTS"));
        assert!(CREATE_TABLE_SQL.contains("slot TEXT NOT NULL UNIQUE"));
    }

    #[test]
    fn test_non_database_error_is_not_create_race() {
        assert!(!lost_create_race(&sqlx::Error::RowNotFound));
    }
}
