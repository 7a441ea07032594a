//! Business logic services for admin.
//!
//! # Services
//!
//! - `connections` - Shopify store connection bootstrap, lookup and save

pub mod connections;

pub use connections::{
    ConnectionError, ConnectionForm, ConnectionLookup, ConnectionManager, ConnectionStatus,
    PersistenceOperation, SchemaBootstrap,
};
