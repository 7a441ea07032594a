//! Core types for Shopdesk.
//!
//! This module provides type-safe wrappers for the store connection domain.

pub mod credential;
pub mod id;
pub mod status;
pub mod store_url;

pub use credential::{ConnectionCredentials, CredentialError, StoreConnection};
pub use id::{ConnectionId, ConnectionSlot, SlotError};
pub use status::{SaveOutcome, SchemaState};
pub use store_url::{StoreUrl, StoreUrlError};
