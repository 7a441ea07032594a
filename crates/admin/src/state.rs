//! Application state shared across handlers.

use std::sync::Arc;

use crate::services::connections::ConnectionManager;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds no connection data itself; every
/// request reads through the manager to the store.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    connections: ConnectionManager,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            inner: Arc::new(AppStateInner { connections }),
        }
    }

    /// Get the store connection manager.
    #[must_use]
    pub fn connections(&self) -> &ConnectionManager {
        &self.inner.connections
    }
}
