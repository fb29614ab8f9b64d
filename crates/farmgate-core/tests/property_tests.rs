//! # Property-Based Tests
//!
//! Verification tests using proptest for the lifecycle policy engine.
//!
//! These tests ensure the transition tables stay closed, deterministic,
//! and role-gated no matter which (status, role) pair is thrown at them.

use farmgate_core::{
    Actor, ActorId, Lifecycle, NotificationState, OrderStatus, PaymentStatus, ProductStatus, Role,
    Session, VerificationStatus,
};
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn any_role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn any_order_status() -> impl Strategy<Value = OrderStatus> {
    prop::sample::select(OrderStatus::all().to_vec())
}

fn any_payment_status() -> impl Strategy<Value = PaymentStatus> {
    prop::sample::select(PaymentStatus::all().to_vec())
}

fn any_product_status() -> impl Strategy<Value = ProductStatus> {
    prop::sample::select(ProductStatus::all().to_vec())
}

fn any_verification_status() -> impl Strategy<Value = VerificationStatus> {
    prop::sample::select(VerificationStatus::all().to_vec())
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Re-applying the current status is always allowed, for every
    /// status/role pair, on every state machine.
    #[test]
    fn idempotent_self_transition_always_allowed(
        order in any_order_status(),
        payment in any_payment_status(),
        product in any_product_status(),
        verification in any_verification_status(),
        role in any_role(),
    ) {
        prop_assert!(order.can_transition(order, role));
        prop_assert!(payment.can_transition(payment, role));
        prop_assert!(product.can_transition(product, role));
        prop_assert!(verification.can_transition(verification, role));
        prop_assert!(NotificationState::Read.can_transition(NotificationState::Read, role));
    }

    /// Terminal statuses admit no outgoing transition for any role.
    #[test]
    fn terminal_statuses_are_absorbing(role in any_role()) {
        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            prop_assert!(terminal.is_terminal());
            prop_assert!(terminal.allowed_next(role).is_empty());
        }
        prop_assert!(PaymentStatus::Refunded.allowed_next(role).is_empty());
        prop_assert!(ProductStatus::Deleted.allowed_next(role).is_empty());
        prop_assert!(VerificationStatus::Verified.allowed_next(role).is_empty());
        prop_assert!(VerificationStatus::Rejected.allowed_next(role).is_empty());
        prop_assert!(NotificationState::Read.allowed_next(role).is_empty());
    }

    /// A permitted order move is either a self-transition, the single
    /// pipeline successor, or a buyer cancellation. No status is ever
    /// skipped.
    #[test]
    fn order_pipeline_never_skips(
        from in any_order_status(),
        to in any_order_status(),
        role in any_role(),
    ) {
        let pipeline_successor = matches!(
            (from, to),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Confirmed, OrderStatus::Preparing)
                | (OrderStatus::Preparing, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
                | (OrderStatus::Delivered, OrderStatus::Completed)
        );
        let buyer_cancel =
            role == Role::Buyer && to == OrderStatus::Cancelled && !from.is_terminal();

        if from.can_transition(to, role) {
            prop_assert!(from == to || pipeline_successor || buyer_cancel);
        }
    }

    /// Only admins ever move a verification document.
    #[test]
    fn document_review_is_admin_only(
        from in any_verification_status(),
        to in any_verification_status(),
        role in any_role(),
    ) {
        if from != to && from.can_transition(to, role) {
            prop_assert_eq!(role, Role::Admin);
        }
    }

    /// `check` and `can_transition` agree for every pair.
    #[test]
    fn check_mirrors_can_transition(
        from in any_order_status(),
        to in any_order_status(),
        role in any_role(),
    ) {
        prop_assert_eq!(from.check(to, role).is_ok(), from.can_transition(to, role));
    }

    /// A failed transition attempt through the session leaves the event
    /// log empty; every success appends exactly one event.
    #[test]
    fn session_event_count_tracks_real_changes(
        targets in prop::collection::vec(any_order_status(), 1..12),
        role in any_role(),
    ) {
        let buyer = ActorId(1);
        let farmer = ActorId(2);
        let mut session = Session::new();
        let order = session.create_order(buyer, farmer, 1_000, 0).expect("create");
        let actor_id = match role {
            Role::Buyer => buyer,
            Role::Farmer => farmer,
            Role::Logistics | Role::Admin => ActorId(3),
        };
        let actor = Actor::new(actor_id, role);

        let mut changes = 0u64;
        for target in targets {
            if let Ok(Some(_)) = session.transition_order(order.id, target, actor, 1) {
                changes += 1;
            }
        }
        let events = session.events_since(0).expect("events");
        prop_assert_eq!(events.len() as u64, changes);
        // seq numbers are dense and start at 1
        for (i, event) in events.iter().enumerate() {
            prop_assert_eq!(event.seq, i as u64 + 1);
        }
    }
}
