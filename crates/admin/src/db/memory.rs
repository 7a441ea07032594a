//! In-process connection store.
//!
//! Mirrors the behavior of [`super::PgConnectionStore`]: the table starts out
//! missing, reads and writes fail with `StoreError::SchemaMissing` until
//! `create_schema` runs, and writes are keyed on the connection slot.
//! Also exposes fault switches and a call counter so tests can observe how the
//! manager drives the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use shopdesk_core::{
    ConnectionCredentials, ConnectionId, ConnectionSlot, SaveOutcome, SchemaState,
    StoreConnection,
};
use tokio::sync::RwLock;

use super::{ConnectionStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    schema_exists: bool,
    rows: HashMap<ConnectionSlot, StoreConnection>,
}

/// In-memory [`ConnectionStore`].
#[derive(Debug, Default)]
pub struct MemoryConnectionStore {
    state: RwLock<MemoryState>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
    reject_schema_creation: AtomicBool,
    stale_schema_check: AtomicBool,
}

impl MemoryConnectionStore {
    /// Create an empty store whose table does not exist yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose table already exists.
    #[must_use]
    pub fn with_schema() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                schema_exists: true,
                rows: HashMap::new(),
            }),
            ..Self::default()
        }
    }

    /// Number of store operations issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of stored records.
    pub async fn row_count(&self) -> usize {
        self.state.read().await.rows.len()
    }

    /// Whether the table currently exists.
    pub async fn has_schema(&self) -> bool {
        self.state.read().await.schema_exists
    }

    /// Drop the table and its rows, as if it vanished between calls.
    pub async fn drop_schema(&self) {
        let mut state = self.state.write().await;
        state.schema_exists = false;
        state.rows.clear();
    }

    /// Make every operation fail as if the store were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `create_schema` fail, e.g. for a role without DDL rights.
    pub fn set_reject_schema_creation(&self, reject: bool) {
        self.reject_schema_creation.store(reject, Ordering::SeqCst);
    }

    /// Make `check_schema` report the table as present even when it is not,
    /// as if it were dropped right after the check.
    pub fn set_stale_schema_check(&self, stale: bool) {
        self.stale_schema_check.store(stale, Ordering::SeqCst);
    }

    /// Count the call and fail if the store is marked unavailable.
    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectionStore for MemoryConnectionStore {
    async fn check_schema(&self) -> Result<SchemaState, StoreError> {
        self.enter()?;
        if self.stale_schema_check.load(Ordering::SeqCst) {
            return Ok(SchemaState::Exists);
        }
        Ok(if self.state.read().await.schema_exists {
            SchemaState::Exists
        } else {
            SchemaState::Missing
        })
    }

    async fn create_schema(&self) -> Result<(), StoreError> {
        self.enter()?;
        if self.reject_schema_creation.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "permission denied to create table".to_string(),
            ));
        }
        self.state.write().await.schema_exists = true;
        Ok(())
    }

    async fn fetch(&self, slot: &ConnectionSlot) -> Result<Option<StoreConnection>, StoreError> {
        self.enter()?;
        let state = self.state.read().await;
        if !state.schema_exists {
            return Err(StoreError::SchemaMissing);
        }
        Ok(state.rows.get(slot).cloned())
    }

    async fn upsert(
        &self,
        slot: &ConnectionSlot,
        credentials: &ConnectionCredentials,
    ) -> Result<(StoreConnection, SaveOutcome), StoreError> {
        self.enter()?;
        let mut state = self.state.write().await;
        if !state.schema_exists {
            return Err(StoreError::SchemaMissing);
        }

        let now = Utc::now();
        let outcome = if let Some(existing) = state.rows.get_mut(slot) {
            existing.store_url = credentials.store_url.clone();
            existing.api_key = credentials.api_key.clone();
            existing.api_secret = credentials.api_secret.clone();
            existing.access_token = credentials.access_token.clone();
            existing.updated_at = now;
            SaveOutcome::Updated
        } else {
            state.rows.insert(
                slot.clone(),
                StoreConnection {
                    id: ConnectionId::generate(),
                    slot: slot.clone(),
                    store_url: credentials.store_url.clone(),
                    api_key: credentials.api_key.clone(),
                    api_secret: credentials.api_secret.clone(),
                    access_token: credentials.access_token.clone(),
                    created_at: now,
                    updated_at: now,
                },
            );
            SaveOutcome::Created
        };

        let stored = state
            .rows
            .get(slot)
            .cloned()
            .ok_or_else(|| StoreError::Unavailable("record vanished during upsert".to_string()))?;
        Ok((stored, outcome))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.enter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn credentials(token: &str) -> ConnectionCredentials {
        ConnectionCredentials::parse("shop.myshopify.com", "k", "s", token).unwrap()
    }

    #[tokio::test]
    async fn test_starts_without_schema() {
        let store = MemoryConnectionStore::new();
        assert_eq!(store.check_schema().await.unwrap(), SchemaState::Missing);
        assert!(matches!(
            store.fetch(&ConnectionSlot::default()).await,
            Err(StoreError::SchemaMissing)
        ));
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let store = MemoryConnectionStore::with_schema();
        let slot = ConnectionSlot::default();

        let (first, outcome) = store.upsert(&slot, &credentials("t")).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Created);

        let (second, outcome) = store.upsert(&slot, &credentials("t2")).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Updated);
        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.row_count().await, 1);
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let store = MemoryConnectionStore::with_schema();
        let other = ConnectionSlot::parse("second").unwrap();

        store
            .upsert(&ConnectionSlot::default(), &credentials("t"))
            .await
            .unwrap();
        let (_, outcome) = store.upsert(&other, &credentials("t")).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Created);
        assert_eq!(store.row_count().await, 2);
    }

    #[tokio::test]
    async fn test_unavailable_fails_every_call() {
        let store = MemoryConnectionStore::with_schema();
        store.set_unavailable(true);

        assert!(matches!(
            store.check_schema().await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.ping().await.is_err());
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test]
    async fn test_stale_schema_check_reports_present_table() {
        let store = MemoryConnectionStore::new();
        store.set_stale_schema_check(true);

        assert_eq!(store.check_schema().await.unwrap(), SchemaState::Exists);
        assert!(matches!(
            store.fetch(&ConnectionSlot::default()).await,
            Err(StoreError::SchemaMissing)
        ));
    }

    #[tokio::test]
    async fn test_drop_schema_clears_rows() {
        let store = MemoryConnectionStore::with_schema();
        store
            .upsert(&ConnectionSlot::default(), &credentials("t"))
            .await
            .unwrap();

        store.drop_schema().await;

        assert!(!store.has_schema().await);
        assert_eq!(store.row_count().await, 0);
    }
}
