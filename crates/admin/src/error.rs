//! Unified error handling for the admin API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::connections::ConnectionError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Submitted connection form is invalid.
    #[error("{0}")]
    Validation(String),

    /// Schema bootstrap from the setup endpoint failed.
    #[error("Failed to initialize database")]
    SetupFailed(#[source] ConnectionError),

    /// The connections table is missing and could not be created.
    #[error("Database setup required")]
    SetupRequired(#[source] ConnectionError),

    /// Reading the connection record failed.
    #[error("Failed to check connection")]
    ConnectionCheck(#[source] ConnectionError),

    /// Writing the connection record failed.
    #[error("{0}")]
    Save(#[source] ConnectionError),
}

impl AppError {
    /// Map a failed status lookup.
    #[must_use]
    pub fn from_lookup(err: ConnectionError) -> Self {
        if err.is_setup_required() {
            Self::SetupRequired(err)
        } else {
            Self::ConnectionCheck(err)
        }
    }

    /// Map a failed save.
    #[must_use]
    pub fn from_save(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Validation(invalid) => Self::Validation(invalid.to_string()),
            other => Self::Save(other),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SetupRequired(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::SetupFailed(_) | Self::ConnectionCheck(_) | Self::Save(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if !matches!(self, Self::Validation(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();
        let body = match &self {
            Self::Validation(_) | Self::Save(_) => json!({
                "success": false,
                "message": self.to_string(),
            }),
            Self::SetupRequired(_) => json!({
                "success": false,
                "message": self.to_string(),
                "setupNeeded": true,
            }),
            // Only the operator-facing summary of the cause is echoed
            Self::SetupFailed(cause) | Self::ConnectionCheck(cause) => json!({
                "success": false,
                "message": self.to_string(),
                "error": cause.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
