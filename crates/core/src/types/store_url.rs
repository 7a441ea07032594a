//! Shopify store URL type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StoreUrl`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreUrlError {
    /// The input string is empty (after trimming).
    #[error("store URL cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("store URL must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input does not reference a `*.myshopify.com` subdomain.
    #[error("store URL must contain {}", StoreUrl::SHOPIFY_DOMAIN)]
    NotShopifyDomain,
}

/// URL of a merchant's Shopify store.
///
/// The only structural requirement is that the value references the merchant's
/// `.myshopify.com` subdomain. Both bare domains and full URLs are accepted and
/// stored as given (minus surrounding whitespace).
///
/// ## Examples
///
/// ```
/// use shopdesk_core::StoreUrl;
///
/// assert!(StoreUrl::parse("shop.myshopify.com").is_ok());
/// assert!(StoreUrl::parse("https://shop.myshopify.com/admin").is_ok());
///
/// assert!(StoreUrl::parse("").is_err());
/// assert!(StoreUrl::parse("shop.example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct StoreUrl(String);

impl StoreUrl {
    /// Marker every merchant store URL must contain.
    pub const SHOPIFY_DOMAIN: &'static str = ".myshopify.com";

    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 2048;

    /// Parse a `StoreUrl` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or does not contain `.myshopify.com`.
    pub fn parse(s: &str) -> Result<Self, StoreUrlError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StoreUrlError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(StoreUrlError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.contains(Self::SHOPIFY_DOMAIN) {
            return Err(StoreUrlError::NotShopifyDomain);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for StoreUrl {
    type Err = StoreUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for StoreUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for StoreUrl {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for StoreUrl {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Only validated URLs are ever written
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for StoreUrl {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_urls() {
        assert!(StoreUrl::parse("shop.myshopify.com").is_ok());
        assert!(StoreUrl::parse("my-shop-42.myshopify.com").is_ok());
        assert!(StoreUrl::parse("https://shop.myshopify.com").is_ok());
        assert!(StoreUrl::parse("https://shop.myshopify.com/admin/apps").is_ok());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let url = StoreUrl::parse("  shop.myshopify.com \n").unwrap();
        assert_eq!(url.as_str(), "shop.myshopify.com");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(StoreUrl::parse(""), Err(StoreUrlError::Empty));
        assert_eq!(StoreUrl::parse("   "), Err(StoreUrlError::Empty));
    }

    #[test]
    fn test_parse_without_shopify_domain() {
        assert_eq!(
            StoreUrl::parse("shop.example.com"),
            Err(StoreUrlError::NotShopifyDomain)
        );
        assert_eq!(
            StoreUrl::parse("myshopify.com"),
            Err(StoreUrlError::NotShopifyDomain)
        );
    }

    #[test]
    fn test_parse_too_long() {
        let long = format!("{}.myshopify.com", "a".repeat(StoreUrl::MAX_LENGTH));
        assert!(matches!(
            StoreUrl::parse(&long),
            Err(StoreUrlError::TooLong { .. })
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreUrlError::NotShopifyDomain.to_string(),
            "store URL must contain .myshopify.com"
        );
    }
}
