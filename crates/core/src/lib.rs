//! Shopdesk Core - Shared domain types.
//!
//! This crate provides the types shared by the Shopdesk components:
//! - `admin` - HTTP service that stores and reports the store connection
//! - `cli` - Command-line tools for schema setup and connection management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. Enable the `postgres` feature for `sqlx` support.
//!
//! # Modules
//!
//! - [`types`] - Connection identifiers, store URLs, credentials and outcomes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
