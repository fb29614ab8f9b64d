//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use farmgate::api::{
    ActorJson, EventJson, HealthResponse, OrderJson, RecordResponse, TransitionRequest,
    TransitionResponse,
};
use farmgate_core::{Actor, ActorId, LifecycleEvent, Order, OrderId, Role};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"status\":\"ok\""));
    assert!(json.contains("\"version\":\"0.4.2\""));
}

// =============================================================================
// ACTOR ENVELOPE TESTS
// =============================================================================

#[test]
fn test_actor_json_parses_role() {
    let actor = ActorJson {
        actor_id: 20,
        role: "farmer".to_string(),
    };
    let parsed = actor.to_actor().unwrap();
    assert_eq!(parsed, Actor::new(ActorId(20), Role::Farmer));
}

#[test]
fn test_actor_json_unknown_role_fails() {
    let actor = ActorJson {
        actor_id: 20,
        role: "wizard".to_string(),
    };
    assert!(actor.to_actor().is_err());
}

#[test]
fn test_transition_request_flattens_actor() {
    // The actor fields sit at the top level of the request body.
    let json = r#"{"actor_id": 10, "role": "buyer", "target": "cancelled"}"#;
    let request: TransitionRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.actor.actor_id, 10);
    assert_eq!(request.actor.role, "buyer");
    assert_eq!(request.target, "cancelled");
}

// =============================================================================
// ENTITY JSON TESTS
// =============================================================================

#[test]
fn test_order_json_carries_wire_names_and_labels() {
    let order = Order::new(OrderId(7), ActorId(10), ActorId(20), 2_500, 1_000);
    let json = OrderJson::from(&order);

    assert_eq!(json.id, 7);
    assert_eq!(json.order_status, "pending");
    assert_eq!(json.order_status_label, "Pending");
    assert_eq!(json.payment_status, "pending");
    assert_eq!(json.total_cents, 2_500);
}

#[test]
fn test_event_json_from_core_event() {
    let event = LifecycleEvent {
        seq: 3,
        kind: farmgate_core::EntityKind::Order,
        entity_id: 7,
        old_status: "pending".to_string(),
        new_status: "confirmed".to_string(),
        actor: Actor::new(ActorId(20), Role::Farmer),
        timestamp_ms: 42,
    };
    let json = EventJson::from(&event);

    assert_eq!(json.seq, 3);
    assert_eq!(json.entity, "order");
    assert_eq!(json.actor_role, "farmer");
    assert_eq!(json.new_status, "confirmed");
}

// =============================================================================
// ENVELOPE TESTS
// =============================================================================

#[test]
fn test_record_response_success_omits_error() {
    let envelope = RecordResponse::success(1u64);
    let json = serde_json::to_string(&envelope).unwrap();
    assert!(json.contains("\"success\":true"));
    assert!(!json.contains("error"));
}

#[test]
fn test_transition_response_noop_shape() {
    let noop = TransitionResponse::noop();
    assert!(noop.success);
    assert!(!noop.changed);
    let json = serde_json::to_string(&noop).unwrap();
    assert!(!json.contains("event"));
}

#[test]
fn test_transition_response_error_shape() {
    let err = TransitionResponse::error("no such transition");
    assert!(!err.success);
    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("\"error\":\"no such transition\""));
}
