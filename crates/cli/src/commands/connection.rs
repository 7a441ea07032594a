//! Store connection commands.
//!
//! # Usage
//!
//! ```bash
//! shopdesk connection show
//! shopdesk connection save --store-url my-shop.myshopify.com \
//!     --api-key KEY --api-secret SECRET --access-token TOKEN
//! ```

use shopdesk_admin::services::{ConnectionError, ConnectionForm};
use shopdesk_core::SaveOutcome;
use thiserror::Error;

use super::{OpenError, open_manager};

/// Errors that can occur during connection commands.
#[derive(Debug, Error)]
pub enum ConnectionCommandError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

/// Print the connected store, if any.
pub async fn show() -> Result<(), ConnectionCommandError> {
    let manager = open_manager()?;

    match manager.status().await? {
        Some(status) => tracing::info!(store_url = %status.store_url, "Store connected"),
        None => tracing::info!("No store connected. Use 'connection save' to add one."),
    }

    Ok(())
}

/// Validate and save store credentials.
///
/// Validation runs before the database is opened, so bad input fails without
/// needing database settings.
pub async fn save(
    store_url: &str,
    api_key: &str,
    api_secret: &str,
    access_token: &str,
) -> Result<SaveOutcome, ConnectionCommandError> {
    let form = ConnectionForm {
        store_url: store_url.to_owned(),
        api_key: api_key.to_owned(),
        api_secret: api_secret.to_owned(),
        access_token: access_token.to_owned(),
    };
    let credentials = form.validate().map_err(ConnectionError::from)?;

    let manager = open_manager()?;
    let outcome = manager.save_credentials(&credentials).await?;

    tracing::info!(store_url = %credentials.store_url, "{}", outcome.message());
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopdesk_core::CredentialError;

    use super::*;

    #[tokio::test]
    async fn test_save_rejects_non_shopify_url_before_opening_database() {
        let err = save("shop.example.com", "k", "s", "t").await.unwrap_err();
        assert!(matches!(
            err,
            ConnectionCommandError::Connection(ConnectionError::Validation(
                CredentialError::InvalidStoreUrl(_)
            ))
        ));
    }

    #[tokio::test]
    async fn test_save_rejects_blank_fields() {
        let err = save("shop.myshopify.com", "", "s", "t").await.unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
    }
}
