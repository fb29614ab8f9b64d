//! Integration tests for the farmgate HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::HeaderValue;
use axum_test::TestServer;
use farmgate::api::{
    AppState, CreateOrderRequest, ExportResponse, HealthResponse, ListResponse, OrderJson,
    ProductJson, RecordResponse, StatusResponse, TransitionResponse, create_router,
};
use farmgate_core::{Actor, ActorId, OrderStatus, Role, Session};
use serde_json::json;
use std::sync::Mutex;

/// Mutex to serialize auth tests since they modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("FARMGATE_API_KEY") };
    }
}

/// Create a test server with a fresh in-memory session.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("FARMGATE_API_KEY") };
    let session = Session::new();
    let state = AppState::new(session);
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

/// Create a test server with one pending order (buyer 10, farmer 20)
/// and one unapproved product (farmer 20).
/// Returns a guard that must be kept alive during the test.
fn create_populated_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("FARMGATE_API_KEY") };

    let mut session = Session::new();
    session
        .create_order(ActorId(10), ActorId(20), 2_500, 1_000)
        .unwrap();
    session
        .create_product(ActorId(20), "Heritage tomatoes", 450, 1_000)
        .unwrap();

    let state = AppState::new(session);
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

fn actor_json(actor_id: u64, role: &str) -> serde_json::Value {
    json!({ "actor_id": actor_id, "role": role })
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_health_returns_correct_version() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;
    let health: HealthResponse = response.json();

    // Version should match Cargo.toml
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STATUS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_status_empty_store() {
    let (server, _guard) = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let envelope: RecordResponse<StatusResponse> = response.json();
    assert!(envelope.success);
    let status = envelope.record.unwrap();
    assert_eq!(status.orders, 0);
    assert_eq!(status.products, 0);
    assert_eq!(status.events, 0);
}

#[tokio::test]
async fn test_status_populated_store() {
    let (server, _guard) = create_populated_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let envelope: RecordResponse<StatusResponse> = response.json();
    let status = envelope.record.unwrap();
    assert_eq!(status.orders, 1);
    assert_eq!(status.products, 1);
}

// =============================================================================
// ORDER ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_create_order() {
    let (server, _guard) = create_test_server();

    let request = CreateOrderRequest {
        buyer_id: 10,
        farmer_id: 20,
        total_cents: 4_200,
    };
    let response = server.post("/orders").json(&request).await;

    response.assert_status_ok();
    let envelope: RecordResponse<OrderJson> = response.json();
    assert!(envelope.success);
    let order = envelope.record.unwrap();
    assert_eq!(order.id, 1);
    assert_eq!(order.order_status, "pending");
    assert_eq!(order.payment_status, "pending");
}

#[tokio::test]
async fn test_create_order_zero_total_rejected() {
    let (server, _guard) = create_test_server();

    let request = json!({ "buyer_id": 10, "farmer_id": 20, "total_cents": 0 });
    let response = server.post("/orders").json(&request).await;

    response.assert_status_bad_request();
    let envelope: RecordResponse<OrderJson> = response.json();
    assert!(!envelope.success);
    assert!(envelope.error.is_some());
}

#[tokio::test]
async fn test_get_order_not_found() {
    let (server, _guard) = create_test_server();

    let response = server.get("/orders/404").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_farmer_confirms_order() {
    let (server, _guard) = create_populated_test_server();

    let mut body = actor_json(20, "farmer");
    body["target"] = json!("confirmed");
    let response = server.post("/orders/1/transition").json(&body).await;

    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert!(result.success);
    assert!(result.changed);
    let event = result.event.unwrap();
    assert_eq!(event.old_status, "pending");
    assert_eq!(event.new_status, "confirmed");
    assert_eq!(event.seq, 1);
}

#[tokio::test]
async fn test_buyer_cannot_confirm_order() {
    let (server, _guard) = create_populated_test_server();

    let mut body = actor_json(10, "buyer");
    body["target"] = json!("confirmed");
    let response = server.post("/orders/1/transition").json(&body).await;

    assert_eq!(response.status_code().as_u16(), 409);
    let result: TransitionResponse = response.json();
    assert!(!result.success);
    assert!(result.error.is_some());
}

#[tokio::test]
async fn test_stranger_cancellation_forbidden() {
    let (server, _guard) = create_populated_test_server();

    // Buyer 99 does not own order 1
    let mut body = actor_json(99, "buyer");
    body["target"] = json!("cancelled");
    let response = server.post("/orders/1/transition").json(&body).await;

    assert_eq!(response.status_code().as_u16(), 403);
}

#[tokio::test]
async fn test_idempotent_transition_is_noop() {
    let (server, _guard) = create_populated_test_server();

    let mut body = actor_json(10, "buyer");
    body["target"] = json!("pending");
    let response = server.post("/orders/1/transition").json(&body).await;

    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert!(result.success);
    assert!(!result.changed);
    assert!(result.event.is_none());
}

#[tokio::test]
async fn test_unknown_status_rejected() {
    let (server, _guard) = create_populated_test_server();

    let mut body = actor_json(20, "farmer");
    body["target"] = json!("teleported");
    let response = server.post("/orders/1/transition").json(&body).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_payment_flow() {
    let (server, _guard) = create_populated_test_server();

    let mut body = actor_json(10, "buyer");
    body["target"] = json!("paid");
    let response = server.post("/orders/1/payment").json(&body).await;

    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert!(result.changed);
    assert_eq!(result.event.unwrap().entity, "payment");

    // Refund requires admin
    let mut refund = actor_json(10, "buyer");
    refund["target"] = json!("refunded");
    let response = server.post("/orders/1/payment").json(&refund).await;
    assert_eq!(response.status_code().as_u16(), 409);

    let mut refund = actor_json(1, "admin");
    refund["target"] = json!("refunded");
    let response = server.post("/orders/1/payment").json(&refund).await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_list_orders_with_status_filter() {
    let (server, _guard) = create_populated_test_server();

    let response = server.get("/orders?status=pending").await;
    response.assert_status_ok();
    let envelope: ListResponse<OrderJson> = response.json();
    assert_eq!(envelope.records.len(), 1);

    let response = server.get("/orders?status=completed").await;
    let envelope: ListResponse<OrderJson> = response.json();
    assert!(envelope.records.is_empty());

    let response = server.get("/orders?status=bogus").await;
    response.assert_status_bad_request();
}

// =============================================================================
// PRODUCT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_product_review_and_delete() {
    let (server, _guard) = create_populated_test_server();

    // Farmer cannot approve their own listing
    let mut body = actor_json(20, "farmer");
    body["decision"] = json!("approve");
    let response = server.post("/products/1/review").json(&body).await;
    assert_eq!(response.status_code().as_u16(), 409);

    // Admin approves
    let mut body = actor_json(1, "admin");
    body["decision"] = json!("approve");
    let response = server.post("/products/1/review").json(&body).await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert_eq!(result.event.unwrap().new_status, "approved");

    // Owning farmer soft-deletes
    let body = actor_json(20, "farmer");
    let response = server.post("/products/1/delete").json(&body).await;
    response.assert_status_ok();

    // The record survives deletion with deleted status
    let response = server.get("/products?status=deleted").await;
    let envelope: ListResponse<ProductJson> = response.json();
    assert_eq!(envelope.records.len(), 1);
    assert_eq!(envelope.records[0].status, "deleted");
}

#[tokio::test]
async fn test_non_owner_farmer_cannot_delete_product() {
    let (server, _guard) = create_populated_test_server();

    let body = actor_json(77, "farmer");
    let response = server.post("/products/1/delete").json(&body).await;
    assert_eq!(response.status_code().as_u16(), 403);
}

// =============================================================================
// DOCUMENT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_document_review_admin_only() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "owner_id": 20,
        "owner_role": "farmer",
        "label": "business licence"
    });
    let response = server.post("/documents").json(&request).await;
    response.assert_status_ok();

    // Logistics cannot review
    let mut body = actor_json(30, "logistics");
    body["decision"] = json!("verify");
    let response = server.post("/documents/1/review").json(&body).await;
    assert_eq!(response.status_code().as_u16(), 409);

    // Admin verifies
    let mut body = actor_json(1, "admin");
    body["decision"] = json!("verify");
    let response = server.post("/documents/1/review").json(&body).await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert_eq!(result.event.unwrap().new_status, "verified");

    // Verified is terminal: a second review decision conflicts
    let mut body = actor_json(1, "admin");
    body["decision"] = json!("reject");
    let response = server.post("/documents/1/review").json(&body).await;
    assert_eq!(response.status_code().as_u16(), 409);
}

#[tokio::test]
async fn test_buyer_document_rejected() {
    let (server, _guard) = create_test_server();

    let request = json!({
        "owner_id": 10,
        "owner_role": "buyer",
        "label": "id card"
    });
    let response = server.post("/documents").json(&request).await;
    response.assert_status_bad_request();
}

// =============================================================================
// NOTIFICATION ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_notification_read_and_delete() {
    let (server, _guard) = create_test_server();

    let request = json!({ "recipient_id": 10, "body": "Your order shipped" });
    let response = server.post("/notifications").json(&request).await;
    response.assert_status_ok();

    // Non-recipient cannot read it
    let body = actor_json(20, "farmer");
    let response = server.post("/notifications/1/read").json(&body).await;
    assert_eq!(response.status_code().as_u16(), 403);

    // Recipient reads it
    let body = actor_json(10, "buyer");
    let response = server.post("/notifications/1/read").json(&body).await;
    response.assert_status_ok();
    let result: TransitionResponse = response.json();
    assert!(result.changed);

    // Second read is a no-op
    let body = actor_json(10, "buyer");
    let response = server.post("/notifications/1/read").json(&body).await;
    let result: TransitionResponse = response.json();
    assert!(!result.changed);

    // Recipient deletes it
    let body = actor_json(10, "buyer");
    let response = server.post("/notifications/1/delete").json(&body).await;
    response.assert_status_ok();
    let envelope: RecordResponse<bool> = response.json();
    assert_eq!(envelope.record, Some(true));

    // Already gone
    let body = actor_json(10, "buyer");
    let response = server.post("/notifications/1/delete").json(&body).await;
    response.assert_status_not_found();
}

// =============================================================================
// EVENTS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_events_since_cursor() {
    let (server, _guard) = create_populated_test_server();

    // Drive the order through two hops
    let mut body = actor_json(20, "farmer");
    body["target"] = json!("confirmed");
    server.post("/orders/1/transition").json(&body).await;
    body["target"] = json!("preparing");
    server.post("/orders/1/transition").json(&body).await;

    let response = server.get("/events").await;
    response.assert_status_ok();
    let envelope: ListResponse<serde_json::Value> = response.json();
    assert_eq!(envelope.records.len(), 2);

    let response = server.get("/events?since=1").await;
    let envelope: ListResponse<serde_json::Value> = response.json();
    assert_eq!(envelope.records.len(), 1);
    assert_eq!(envelope.records[0]["seq"], 2);
    assert_eq!(envelope.records[0]["new_status"], "preparing");
}

// =============================================================================
// EXPORT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_export_empty_store() {
    let (server, _guard) = create_test_server();

    let response = server.post("/export").await;

    response.assert_status_ok();
    let result: ExportResponse = response.json();
    assert!(result.success);
    assert!(result.data.is_some());
    assert!(result.checksum.is_some());
}

#[tokio::test]
async fn test_export_round_trips_through_core() {
    let (server, _guard) = create_populated_test_server();

    let response = server.post("/export").await;
    response.assert_status_ok();
    let result: ExportResponse = response.json();
    assert!(result.success);

    // Data should be valid base64 holding a canonical snapshot
    let data = result.data.unwrap();
    let decoded =
        base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &data).unwrap();
    let snapshot = farmgate_core::export::import_canonical(&decoded).unwrap();
    assert_eq!(snapshot.orders.len(), 1);
    assert_eq!(snapshot.products.len(), 1);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    // axum returns 405 Method Not Allowed
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/orders")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    // Should return 4xx error for invalid JSON
    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Create a test server with authentication enabled.
/// Must be called while holding AUTH_TEST_MUTEX.
fn create_auth_test_server(api_key: &str) -> TestServer {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("FARMGATE_API_KEY", api_key) };
    let session = Session::new();
    let state = AppState::new(session);
    let router = create_router(state);
    TestServer::new(router).unwrap()
}

/// Clean up auth env var after test.
fn cleanup_auth_env() {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("FARMGATE_API_KEY") };
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
    let envelope: RecordResponse<StatusResponse> = response.json();
    assert_eq!(envelope.record.unwrap().orders, 0);
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    // Test raw token format (without "Bearer " prefix)
    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "correct-key";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Invalid token should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "required-key";
    let server = create_auth_test_server(api_key);

    // Request without Authorization header
    let response = server.get("/status").await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Missing Authorization header should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "secret-key-for-bypass-test";
    let server = create_auth_test_server(api_key);

    // /health should be accessible without authentication
    let response = server.get("/health").await;

    cleanup_auth_env();

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "actual-key";
    let server = create_auth_test_server(api_key);

    // "Bearer " with no key should be rejected
    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer ".parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Bearer prefix with no key should return 401 Unauthorized"
    );
}

// =============================================================================
// FULL PIPELINE TEST
// =============================================================================

#[tokio::test]
async fn test_full_order_pipeline_over_http() {
    let (server, _guard) = create_populated_test_server();

    let hops = [
        ("confirmed", 20, "farmer"),
        ("preparing", 20, "farmer"),
        ("shipped", 30, "logistics"),
        ("delivered", 30, "logistics"),
        ("completed", 10, "buyer"),
    ];

    for (target, actor_id, role) in hops {
        let mut body = actor_json(actor_id, role);
        body["target"] = json!(target);
        let response = server.post("/orders/1/transition").json(&body).await;
        response.assert_status_ok();
        let result: TransitionResponse = response.json();
        assert!(result.changed, "hop to {} must apply", target);
    }

    // Completed is terminal: even the buyer cannot cancel now
    let mut body = actor_json(10, "buyer");
    body["target"] = json!("cancelled");
    let response = server.post("/orders/1/transition").json(&body).await;
    assert_eq!(response.status_code().as_u16(), 409);

    // Order reflects the final status
    let response = server.get("/orders/1").await;
    let envelope: RecordResponse<OrderJson> = response.json();
    let order = envelope.record.unwrap();
    assert_eq!(order.order_status, OrderStatus::Completed.as_str());

    // Five events, densely numbered
    let response = server.get("/events").await;
    let envelope: ListResponse<serde_json::Value> = response.json();
    assert_eq!(envelope.records.len(), 5);
}

// =============================================================================
// SANITY: core types round-trip through the wire layer
// =============================================================================

#[tokio::test]
async fn test_actor_roles_parse_like_core() {
    let (_server, _guard) = create_test_server();
    for role in Role::ALL {
        assert_eq!(Role::parse(role.as_str()), Some(role));
    }
    let _ = Actor::new(ActorId(1), Role::Admin);
}
