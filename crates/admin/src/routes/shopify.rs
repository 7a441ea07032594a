//! Shopify store connection routes.
//!
//! Operators submit Admin API credentials as a form and can check whether a
//! store is connected. Credential fields are never returned.

use axum::{Form, Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::services::connections::{ConnectionForm, ConnectionStatus};
use crate::state::AppState;

/// Build the Shopify connection router.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/shopify/connection",
        get(connection_status).post(save_connection),
    )
}

/// Response body for the connection status endpoint.
#[derive(Debug, Serialize)]
pub struct ConnectionStatusResponse {
    pub success: bool,
    pub connection: Option<ConnectionStatus>,
}

/// Response body for a successful save.
#[derive(Debug, Serialize)]
pub struct SaveConnectionResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Report whether a store is connected.
#[instrument(skip_all)]
async fn connection_status(
    State(state): State<AppState>,
) -> Result<Json<ConnectionStatusResponse>, AppError> {
    let connection = state
        .connections()
        .status()
        .await
        .map_err(AppError::from_lookup)?;

    Ok(Json(ConnectionStatusResponse {
        success: true,
        connection,
    }))
}

/// Validate and store submitted credentials.
#[instrument(skip_all)]
async fn save_connection(
    State(state): State<AppState>,
    Form(form): Form<ConnectionForm>,
) -> Result<Json<SaveConnectionResponse>, AppError> {
    let outcome = state
        .connections()
        .save(&form)
        .await
        .map_err(AppError::from_save)?;

    Ok(Json(SaveConnectionResponse {
        success: true,
        message: outcome.message(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use shopdesk_core::ConnectionSlot;
    use tower::ServiceExt;

    use super::*;
    use crate::db::MemoryConnectionStore;
    use crate::services::connections::ConnectionManager;

    fn app(store: Arc<MemoryConnectionStore>) -> Router {
        let manager = ConnectionManager::new(store, ConnectionSlot::default());
        router().with_state(AppState::new(manager))
    }

    fn post_form(body: &'static str) -> Request<Body> {
        Request::post("/api/shopify/connection")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_status() {
        let store = Arc::new(MemoryConnectionStore::new());
        let app = app(store);

        let response = app
            .clone()
            .oneshot(post_form(
                "store_url=shop.myshopify.com&api_key=k&api_secret=s&access_token=t",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Connection created successfully");

        let response = app
            .oneshot(
                Request::get("/api/shopify/connection")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["connection"]["store_url"], "shop.myshopify.com");
        assert_eq!(body["connection"]["connected"], true);
        assert!(body["connection"].get("access_token").is_none());
    }

    #[tokio::test]
    async fn test_missing_field_is_unprocessable() {
        let store = Arc::new(MemoryConnectionStore::new());
        let response = app(store.clone())
            .oneshot(post_form("store_url=shop.myshopify.com&api_key=k"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "All fields are required");
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_status_requires_setup_when_table_cannot_be_created() {
        let store = Arc::new(MemoryConnectionStore::new());
        store.set_reject_schema_creation(true);

        let response = app(store)
            .oneshot(
                Request::get("/api/shopify/connection")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["setupNeeded"], true);
    }
}
