//! Shopdesk admin library.
//!
//! Stores the Shopify Admin API credentials for the connected store and
//! exposes a small HTTP API to bootstrap the database, save credentials and
//! report connection status.
//!
//! # Security
//!
//! The `store_connections` table holds the store's Admin API access token.
//! Only deploy behind a private network; responses never echo credentials.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
