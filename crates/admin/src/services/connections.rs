//! Store connection lifecycle.
//!
//! [`ConnectionManager`] owns the rules around the single credential record:
//!
//! - the table is created on first use ([`ConnectionManager::ensure_schema`])
//! - reads report present, absent, or failed ([`ConnectionManager::get`])
//! - writes validate first and then upsert atomically ([`ConnectionManager::save`])
//!
//! The manager holds no copy of the record; every call goes to the store.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shopdesk_core::{
    ConnectionCredentials, ConnectionSlot, CredentialError, SaveOutcome, SchemaState,
    StoreConnection,
};
use thiserror::Error;
use tracing::instrument;

use crate::db::{ConnectionStore, StoreError};

/// Store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOperation {
    /// Reading the record.
    Fetch,
    /// Writing the record.
    Save,
}

impl fmt::Display for PersistenceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch => f.write_str("fetch"),
            Self::Save => f.write_str("save"),
        }
    }
}

/// Errors from the connection lifecycle.
///
/// `Display` text is safe to show operators; store details stay in the
/// `source` chain.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Submitted credentials are invalid. Nothing was sent to the store.
    #[error(transparent)]
    Validation(#[from] CredentialError),

    /// The table is missing and could not be created.
    #[error("Failed to create database tables")]
    SchemaUnavailable {
        #[source]
        source: StoreError,
    },

    /// A read or write failed for a reason other than a missing table.
    #[error("Failed to {operation} connection")]
    Persistence {
        operation: PersistenceOperation,
        #[source]
        source: StoreError,
    },
}

impl ConnectionError {
    /// Whether the error means the schema has not been set up.
    #[must_use]
    pub const fn is_setup_required(&self) -> bool {
        matches!(self, Self::SchemaUnavailable { .. })
    }
}

/// How `ensure_schema` satisfied itself that the table exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaBootstrap {
    /// The check found the table.
    AlreadyPresent,
    /// The check found no table and it was created.
    Created,
    /// The check failed; the table is assumed present and the next real
    /// operation will surface any genuine failure.
    Assumed,
}

/// Result of reading the connection record.
#[derive(Debug)]
pub enum ConnectionLookup {
    /// A record is stored.
    Present(StoreConnection),
    /// No record has been saved yet.
    Absent,
    /// The store could not answer.
    Failed(ConnectionError),
}

impl ConnectionLookup {
    /// Collapse to an `Option`, treating failure as absence.
    #[must_use]
    pub fn into_option(self) -> Option<StoreConnection> {
        match self {
            Self::Present(connection) => Some(connection),
            Self::Absent | Self::Failed(_) => None,
        }
    }
}

/// Raw connection form as submitted by an operator.
///
/// Missing fields deserialize as empty strings so that validation, not the
/// extractor, reports them.
#[derive(Clone, Default, Deserialize)]
pub struct ConnectionForm {
    #[serde(default)]
    pub store_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub access_token: String,
}

impl fmt::Debug for ConnectionForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionForm")
            .field("store_url", &self.store_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl ConnectionForm {
    /// Validate the form into credentials.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if a field is empty or the store URL is not a
    /// Shopify URL.
    pub fn validate(&self) -> Result<ConnectionCredentials, CredentialError> {
        ConnectionCredentials::parse(
            &self.store_url,
            &self.api_key,
            &self.api_secret,
            &self.access_token,
        )
    }
}

/// Connection summary safe to return to clients. Contains no credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub store_url: String,
    pub connected: bool,
}

impl From<&StoreConnection> for ConnectionStatus {
    fn from(connection: &StoreConnection) -> Self {
        Self {
            store_url: connection.store_url.to_string(),
            connected: true,
        }
    }
}

/// Manages the store connection record for one slot.
#[derive(Clone)]
pub struct ConnectionManager {
    store: Arc<dyn ConnectionStore>,
    slot: ConnectionSlot,
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl ConnectionManager {
    /// Create a manager over `store` for the given slot.
    #[must_use]
    pub fn new(store: Arc<dyn ConnectionStore>, slot: ConnectionSlot) -> Self {
        Self { store, slot }
    }

    /// The slot this manager reads and writes.
    #[must_use]
    pub const fn slot(&self) -> &ConnectionSlot {
        &self.slot
    }

    /// Make sure the connections table exists, creating it if needed.
    ///
    /// A check that fails outright is not treated as "missing": the table is
    /// assumed present and the call succeeds with [`SchemaBootstrap::Assumed`].
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::SchemaUnavailable` if the table is missing
    /// and creating it fails.
    #[instrument(skip(self), fields(slot = %self.slot))]
    pub async fn ensure_schema(&self) -> Result<SchemaBootstrap, ConnectionError> {
        match self.store.check_schema().await {
            Ok(SchemaState::Exists) => Ok(SchemaBootstrap::AlreadyPresent),
            Ok(SchemaState::Missing) => {
                tracing::info!("Creating store_connections table");
                self.store.create_schema().await.map_err(|source| {
                    tracing::error!(error = %source, "Failed to create store_connections table");
                    ConnectionError::SchemaUnavailable { source }
                })?;
                tracing::info!("store_connections table created");
                Ok(SchemaBootstrap::Created)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Schema check failed, assuming table exists");
                Ok(SchemaBootstrap::Assumed)
            }
        }
    }

    /// Read the connection record.
    #[instrument(skip(self), fields(slot = %self.slot))]
    pub async fn get(&self) -> ConnectionLookup {
        if let Err(err) = self.ensure_schema().await {
            return ConnectionLookup::Failed(err);
        }

        match self.store.fetch(&self.slot).await {
            Ok(Some(connection)) => ConnectionLookup::Present(connection),
            Ok(None) => ConnectionLookup::Absent,
            Err(StoreError::SchemaMissing) => {
                // Table vanished between the check and the read
                tracing::warn!("store_connections table does not exist yet");
                ConnectionLookup::Absent
            }
            Err(source) => {
                tracing::error!(error = %source, "Error fetching store connection");
                ConnectionLookup::Failed(ConnectionError::Persistence {
                    operation: PersistenceOperation::Fetch,
                    source,
                })
            }
        }
    }

    /// Redacted connection summary, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the store could not be read.
    pub async fn status(&self) -> Result<Option<ConnectionStatus>, ConnectionError> {
        match self.get().await {
            ConnectionLookup::Present(connection) => Ok(Some(ConnectionStatus::from(&connection))),
            ConnectionLookup::Absent => Ok(None),
            ConnectionLookup::Failed(err) => Err(err),
        }
    }

    /// Validate and store credentials.
    ///
    /// Creates the record on first save and updates it in place afterwards.
    /// Invalid input is rejected before the store is touched.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::Validation` for bad input,
    /// `ConnectionError::SchemaUnavailable` if the table cannot be created, and
    /// `ConnectionError::Persistence` if the write fails.
    #[instrument(skip(self, form), fields(slot = %self.slot, store_url = %form.store_url))]
    pub async fn save(&self, form: &ConnectionForm) -> Result<SaveOutcome, ConnectionError> {
        let credentials = form.validate()?;
        self.save_credentials(&credentials).await
    }

    /// Store already-validated credentials.
    ///
    /// # Errors
    ///
    /// See [`Self::save`].
    pub async fn save_credentials(
        &self,
        credentials: &ConnectionCredentials,
    ) -> Result<SaveOutcome, ConnectionError> {
        self.ensure_schema().await?;

        let (connection, outcome) = self
            .store
            .upsert(&self.slot, credentials)
            .await
            .map_err(|source| {
                tracing::error!(error = %source, "Error saving store connection");
                ConnectionError::Persistence {
                    operation: PersistenceOperation::Save,
                    source,
                }
            })?;

        tracing::info!(
            connection_id = %connection.id,
            outcome = ?outcome,
            "Store connection saved"
        );
        Ok(outcome)
    }

    /// Check that the backing store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store cannot be reached.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}
