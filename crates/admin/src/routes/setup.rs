//! Database setup route.
//!
//! Creates the connections table on demand so operators can bootstrap a fresh
//! database before saving credentials.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Build the setup router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/setup", get(run_setup))
}

/// Response body for a successful setup.
#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub success: bool,
    pub message: &'static str,
}

#[instrument(skip_all)]
async fn run_setup(State(state): State<AppState>) -> Result<Json<SetupResponse>, AppError> {
    let bootstrap = state
        .connections()
        .ensure_schema()
        .await
        .map_err(AppError::SetupFailed)?;
    tracing::info!(?bootstrap, "Database setup complete");

    Ok(Json(SetupResponse {
        success: true,
        message: "Database initialized successfully",
    }))
}
