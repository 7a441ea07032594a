//! Outcome enums for connection storage operations.

use serde::{Deserialize, Serialize};

/// What a successful save did to the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// No record existed; one was inserted.
    Created,
    /// The existing record was updated in place.
    Updated,
}

impl SaveOutcome {
    /// Operator-facing confirmation message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Created => "Connection created successfully",
            Self::Updated => "Connection updated successfully",
        }
    }
}

/// Result of probing the backing store for the connections table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaState {
    /// The table exists.
    Exists,
    /// The table has not been created yet.
    Missing,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_save_outcome_messages() {
        assert_eq!(
            SaveOutcome::Created.message(),
            "Connection created successfully"
        );
        assert_eq!(
            SaveOutcome::Updated.message(),
            "Connection updated successfully"
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&SaveOutcome::Created).unwrap(),
            "\"created\""
        );
        assert_eq!(
            serde_json::to_string(&SchemaState::Missing).unwrap(),
            "\"missing\""
        );
    }
}
