//! Integration tests for Shopdesk.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory tests (no external services)
//! cargo test -p shopdesk-integration-tests
//!
//! # Live PostgreSQL and live server tests
//! cargo test -p shopdesk-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `connection_lifecycle` - Manager behavior against the in-memory store
//! - `http_routes` - Router behavior via `tower::ServiceExt::oneshot`
//! - `postgres_store` - `PgConnectionStore` against a real database (ignored)
//! - `live_server` - Running admin server over HTTP (ignored)

use std::sync::Arc;

use axum::Router;
use shopdesk_admin::db::MemoryConnectionStore;
use shopdesk_admin::routes;
use shopdesk_admin::services::{ConnectionForm, ConnectionManager};
use shopdesk_admin::state::AppState;
use shopdesk_core::ConnectionSlot;

/// Build a form with the given store URL and access token and fixed key and
/// secret.
#[must_use]
pub fn form(store_url: &str, access_token: &str) -> ConnectionForm {
    ConnectionForm {
        store_url: store_url.to_string(),
        api_key: "k".to_string(),
        api_secret: "s".to_string(),
        access_token: access_token.to_string(),
    }
}

/// A manager over a fresh in-memory store whose table does not exist yet.
#[must_use]
pub fn memory_manager() -> (Arc<MemoryConnectionStore>, ConnectionManager) {
    let store = Arc::new(MemoryConnectionStore::new());
    let manager = ConnectionManager::new(store.clone(), ConnectionSlot::default());
    (store, manager)
}

/// The full application router over `store`.
#[must_use]
pub fn memory_app(store: Arc<MemoryConnectionStore>) -> Router {
    let manager = ConnectionManager::new(store, ConnectionSlot::default());
    routes::app(AppState::new(manager))
}

/// Base URL for a running admin server (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("SHOPDESK_ADMIN_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}
