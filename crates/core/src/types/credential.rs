//! Store connection credentials.
//!
//! [`ConnectionCredentials`] is the validated write model: the four values an
//! operator submits. [`StoreConnection`] is the persisted record returned by
//! reads. Both implement `Debug` manually so API secrets never reach logs.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use super::id::{ConnectionId, ConnectionSlot};
use super::store_url::{StoreUrl, StoreUrlError};

/// Validation failures for submitted credentials.
///
/// The `Display` text is shown to operators as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// One or more of the four fields was empty.
    #[error("All fields are required")]
    MissingFields {
        /// Names of the empty fields, in form order.
        fields: Vec<&'static str>,
    },
    /// The store URL does not point at a Shopify store.
    #[error("Store URL must be a valid Shopify store URL")]
    InvalidStoreUrl(#[source] StoreUrlError),
}

/// Validated credentials for a Shopify store.
#[derive(Clone)]
pub struct ConnectionCredentials {
    /// Merchant store URL.
    pub store_url: StoreUrl,
    /// Shopify API key.
    pub api_key: String,
    /// Shopify API secret key.
    pub api_secret: SecretString,
    /// Admin API access token.
    pub access_token: SecretString,
}

impl ConnectionCredentials {
    /// Validate raw form input.
    ///
    /// Emptiness is checked for all four fields before the store URL is
    /// inspected, so an operator sees "All fields are required" first.
    /// Values that are only whitespace count as empty.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::MissingFields`] if any field is empty and
    /// [`CredentialError::InvalidStoreUrl`] if the URL is not a
    /// `*.myshopify.com` URL.
    pub fn parse(
        store_url: &str,
        api_key: &str,
        api_secret: &str,
        access_token: &str,
    ) -> Result<Self, CredentialError> {
        let fields = [
            ("store_url", store_url),
            ("api_key", api_key),
            ("api_secret", api_secret),
            ("access_token", access_token),
        ];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(CredentialError::MissingFields { fields: missing });
        }

        let store_url = StoreUrl::parse(store_url).map_err(CredentialError::InvalidStoreUrl)?;

        Ok(Self {
            store_url,
            api_key: api_key.trim().to_owned(),
            api_secret: SecretString::from(api_secret.trim()),
            access_token: SecretString::from(access_token.trim()),
        })
    }
}

impl std::fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("store_url", &self.store_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for ConnectionCredentials {
    fn eq(&self, other: &Self) -> bool {
        self.store_url == other.store_url
            && self.api_key == other.api_key
            && self.api_secret.expose_secret() == other.api_secret.expose_secret()
            && self.access_token.expose_secret() == other.access_token.expose_secret()
    }
}

/// The persisted connection record.
#[derive(Clone)]
pub struct StoreConnection {
    /// Generated primary key, stable across updates.
    pub id: ConnectionId,
    /// Logical key the record is stored under.
    pub slot: ConnectionSlot,
    /// Merchant store URL.
    pub store_url: StoreUrl,
    /// Shopify API key.
    pub api_key: String,
    /// Shopify API secret key.
    pub api_secret: SecretString,
    /// Admin API access token.
    pub access_token: SecretString,
    /// When the record was first saved.
    pub created_at: DateTime<Utc>,
    /// When the record was last saved.
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for StoreConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnection")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("store_url", &self.store_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_credentials() {
        let creds =
            ConnectionCredentials::parse("shop.myshopify.com", "key", "secret", "token").unwrap();
        assert_eq!(creds.store_url.as_str(), "shop.myshopify.com");
        assert_eq!(creds.api_key, "key");
        assert_eq!(creds.api_secret.expose_secret(), "secret");
        assert_eq!(creds.access_token.expose_secret(), "token");
    }

    #[test]
    fn test_parse_reports_every_missing_field() {
        let err = ConnectionCredentials::parse("", "key", " ", "").unwrap_err();
        assert_eq!(
            err,
            CredentialError::MissingFields {
                fields: vec!["store_url", "api_secret", "access_token"]
            }
        );
        assert_eq!(err.to_string(), "All fields are required");
    }

    #[test]
    fn test_missing_fields_checked_before_store_url() {
        let err = ConnectionCredentials::parse("shop.example.com", "", "s", "t").unwrap_err();
        assert!(matches!(err, CredentialError::MissingFields { .. }));
    }

    #[test]
    fn test_parse_rejects_non_shopify_url() {
        let err = ConnectionCredentials::parse("shop.example.com", "k", "s", "t").unwrap_err();
        assert_eq!(
            err,
            CredentialError::InvalidStoreUrl(StoreUrlError::NotShopifyDomain)
        );
        assert_eq!(
            err.to_string(),
            "Store URL must be a valid Shopify store URL"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = ConnectionCredentials::parse(
            "shop.myshopify.com",
            "public_key",
            "super_secret_value",
            "shpat_super_secret_token",
        )
        .unwrap();

        let debug_output = format!("{creds:?}");

        assert!(debug_output.contains("shop.myshopify.com"));
        assert!(debug_output.contains("public_key"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_value"));
        assert!(!debug_output.contains("shpat_super_secret_token"));
    }

    #[test]
    fn test_store_connection_debug_redacts_secrets() {
        let now = Utc::now();
        let connection = StoreConnection {
            id: ConnectionId::generate(),
            slot: ConnectionSlot::default(),
            store_url: StoreUrl::parse("shop.myshopify.com").unwrap(),
            api_key: "k".to_string(),
            api_secret: SecretString::from("hidden_api_secret"),
            access_token: SecretString::from("hidden_access_token"),
            created_at: now,
            updated_at: now,
        };

        let debug_output = format!("{connection:?}");
        assert!(!debug_output.contains("hidden_api_secret"));
        assert!(!debug_output.contains("hidden_access_token"));
    }
}
