//! Identifiers for store connection records.
//!
//! A connection row has two identities:
//!
//! - [`ConnectionId`] - the generated primary key, stable across updates
//! - [`ConnectionSlot`] - the logical key the row is upserted on
//!
//! Today every deployment uses a single slot ([`ConnectionSlot::DEFAULT`]), which
//! gives the single-record invariant. Keying writes on the slot rather than on the
//! primary key keeps room for one slot per store later without a schema change.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Primary key of a stored connection.
///
/// Generated by the backing store on insert and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ConnectionId> for Uuid {
    fn from(id: ConnectionId) -> Self {
        id.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ConnectionId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Uuid as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ConnectionId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let id = <Uuid as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(id))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ConnectionId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Uuid as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// Errors that can occur when parsing a [`ConnectionSlot`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// The slot name is empty.
    #[error("connection slot cannot be empty")]
    Empty,
    /// The slot name is too long.
    #[error("connection slot must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slot name contains characters outside `[a-z0-9_-]`.
    #[error("connection slot may only contain lowercase letters, digits, '-' and '_'")]
    InvalidCharacter,
}

/// Logical key a connection record is stored under.
///
/// ## Examples
///
/// ```
/// use shopdesk_core::ConnectionSlot;
///
/// assert_eq!(ConnectionSlot::default().as_str(), "default");
/// assert!(ConnectionSlot::parse("eu-store").is_ok());
/// assert!(ConnectionSlot::parse("").is_err());
/// assert!(ConnectionSlot::parse("Bad Slot").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionSlot(String);

impl ConnectionSlot {
    /// Slot used by single-store deployments.
    pub const DEFAULT: &'static str = "default";

    /// Maximum length of a slot name.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a slot name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, longer than 64 characters, or
    /// contains anything other than lowercase ASCII letters, digits, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SlotError> {
        if s.is_empty() {
            return Err(SlotError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlotError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(SlotError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the slot name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionSlot {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for ConnectionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ConnectionSlot {
    type Err = SlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_roundtrips_uuid() {
        let uuid = Uuid::new_v4();
        let id = ConnectionId::from(uuid);
        assert_eq!(Uuid::from(id), uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ConnectionId::generate(), ConnectionId::generate());
    }

    #[test]
    fn test_connection_id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&ConnectionId::from(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn test_default_slot() {
        assert_eq!(ConnectionSlot::default().as_str(), ConnectionSlot::DEFAULT);
    }

    #[test]
    fn test_slot_rejects_bad_input() {
        assert_eq!(ConnectionSlot::parse(""), Err(SlotError::Empty));
        assert_eq!(
            ConnectionSlot::parse(&"a".repeat(65)),
            Err(SlotError::TooLong { max: 64 })
        );
        assert_eq!(
            ConnectionSlot::parse("Main"),
            Err(SlotError::InvalidCharacter)
        );
        assert_eq!(
            ConnectionSlot::parse("a b"),
            Err(SlotError::InvalidCharacter)
        );
    }

    #[test]
    fn test_slot_accepts_valid_names() {
        assert!(ConnectionSlot::parse("default").is_ok());
        assert!(ConnectionSlot::parse("store_2").is_ok());
        assert!(ConnectionSlot::parse(&"a".repeat(64)).is_ok());
        assert_eq!(
            "eu-store".parse::<ConnectionSlot>().unwrap().to_string(),
            "eu-store"
        );
    }
}
