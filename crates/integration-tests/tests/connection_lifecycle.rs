//! Integration tests for the store connection lifecycle.
//!
//! These run the connection manager against the in-memory store, so no
//! database is needed.

use secrecy::ExposeSecret;
use shopdesk_admin::services::{ConnectionError, ConnectionLookup, SchemaBootstrap};
use shopdesk_core::{CredentialError, SaveOutcome};
use shopdesk_integration_tests::{form, memory_manager};

// =============================================================================
// Create / Update
// =============================================================================

#[tokio::test]
async fn test_first_save_creates_second_updates_same_record() {
    let (store, manager) = memory_manager();

    let first = manager
        .save(&form("shop.myshopify.com", "t"))
        .await
        .expect("first save");
    assert_eq!(first, SaveOutcome::Created);
    assert_eq!(store.row_count().await, 1);

    let ConnectionLookup::Present(created) = manager.get().await else {
        panic!("expected record after first save");
    };

    let second = manager
        .save(&form("shop.myshopify.com", "t2"))
        .await
        .expect("second save");
    assert_eq!(second, SaveOutcome::Updated);
    assert_eq!(store.row_count().await, 1);

    let ConnectionLookup::Present(updated) = manager.get().await else {
        panic!("expected record after second save");
    };
    assert_eq!(created.id, updated.id);
    assert_eq!(created.created_at, updated.created_at);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_save_get_update_scenario() {
    let (_store, manager) = memory_manager();

    let outcome = manager
        .save(&form("shop.myshopify.com", "t"))
        .await
        .expect("save");
    assert_eq!(outcome.message(), "Connection created successfully");

    let connection = manager.get().await.into_option().expect("stored record");
    assert_eq!(connection.store_url.as_str(), "shop.myshopify.com");
    assert_eq!(connection.api_key, "k");
    assert_eq!(connection.api_secret.expose_secret(), "s");
    assert_eq!(connection.access_token.expose_secret(), "t");

    let outcome = manager
        .save(&form("shop.myshopify.com", "t2"))
        .await
        .expect("update");
    assert_eq!(outcome.message(), "Connection updated successfully");

    let connection = manager.get().await.into_option().expect("stored record");
    assert_eq!(connection.access_token.expose_secret(), "t2");
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_any_empty_field_fails_without_store_call() {
    let (store, manager) = memory_manager();
    let valid = form("shop.myshopify.com", "t");

    let mut cases = Vec::new();
    for field in 0..4 {
        let mut candidate = valid.clone();
        match field {
            0 => candidate.store_url = String::new(),
            1 => candidate.api_key = String::new(),
            2 => candidate.api_secret = "   ".to_string(),
            _ => candidate.access_token = String::new(),
        }
        cases.push(candidate);
    }

    for candidate in &cases {
        let err = manager.save(candidate).await.expect_err("must reject");
        assert!(
            matches!(
                err,
                ConnectionError::Validation(CredentialError::MissingFields { .. })
            ),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.to_string(), "All fields are required");
    }

    assert_eq!(store.calls(), 0);
    assert!(!store.has_schema().await);
}

#[tokio::test]
async fn test_store_url_must_be_shopify_domain() {
    let (store, manager) = memory_manager();

    for url in ["shop.example.com", "myshopify.com", "https://shop.shopify.com"] {
        let err = manager
            .save(&form(url, "t"))
            .await
            .expect_err("must reject");
        assert!(matches!(
            err,
            ConnectionError::Validation(CredentialError::InvalidStoreUrl(_))
        ));
        assert_eq!(err.to_string(), "Store URL must be a valid Shopify store URL");
    }

    assert_eq!(store.calls(), 0);
}

// =============================================================================
// Lookup
// =============================================================================

#[tokio::test]
async fn test_get_on_empty_store_is_absent() {
    let (store, manager) = memory_manager();

    assert!(matches!(manager.get().await, ConnectionLookup::Absent));
    // The lookup bootstrapped the table
    assert!(store.has_schema().await);
}

#[tokio::test]
async fn test_get_failure_is_not_absence() {
    let (store, manager) = memory_manager();
    manager.ensure_schema().await.expect("bootstrap");
    store.set_unavailable(true);

    assert!(matches!(manager.get().await, ConnectionLookup::Failed(_)));
}

#[tokio::test]
async fn test_dropped_table_is_recreated_on_next_use() {
    let (store, manager) = memory_manager();
    manager
        .save(&form("shop.myshopify.com", "t"))
        .await
        .expect("save");

    store.drop_schema().await;

    assert!(matches!(manager.get().await, ConnectionLookup::Absent));
    assert!(store.has_schema().await);
}

// =============================================================================
// Schema Bootstrap
// =============================================================================

#[tokio::test]
async fn test_ensure_schema_is_idempotent() {
    let (store, manager) = memory_manager();

    assert_eq!(
        manager.ensure_schema().await.expect("first"),
        SchemaBootstrap::Created
    );
    for _ in 0..3 {
        assert_eq!(
            manager.ensure_schema().await.expect("repeat"),
            SchemaBootstrap::AlreadyPresent
        );
    }
    assert!(store.has_schema().await);
    assert_eq!(store.row_count().await, 0);
}

#[tokio::test]
async fn test_ensure_schema_preserves_existing_record() {
    let (store, manager) = memory_manager();
    manager
        .save(&form("shop.myshopify.com", "t"))
        .await
        .expect("save");

    manager.ensure_schema().await.expect("ensure");

    assert_eq!(store.row_count().await, 1);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_on_empty_store_leave_one_record() {
    let (store, manager) = memory_manager();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .save(&form("shop.myshopify.com", &format!("token-{i}")))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        let outcome = handle.await.expect("task").expect("save");
        if outcome == SaveOutcome::Created {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(store.row_count().await, 1);
}
