//! # Lifecycle Policy Engine
//!
//! The single transition-table module for every Farmgate entity.
//!
//! Both server validation and client rendering consult these tables,
//! so there is exactly one answer to "what may happen next" — the
//! scattered per-view status conditionals of a typical admin UI have no
//! counterpart here.
//!
//! All rules are:
//! - Deterministic
//! - Hardcoded (no runtime configuration of transitions)
//! - Pure role gating; ownership checks live in `Session` where the
//!   entity record is in hand

use crate::types::{
    EntityKind, FarmgateError, NotificationState, OrderStatus, PaymentStatus, ProductStatus, Role,
    VerificationStatus,
};

// =============================================================================
// LIFECYCLE TRAIT
// =============================================================================

/// A status enumeration governed by a role-gated transition table.
///
/// Implementors supply the table (`allowed_next`); the predicates are
/// derived from it, so table and checks can never drift apart.
pub trait Lifecycle: Copy + Eq + Sized + 'static {
    /// The entity kind this status belongs to, for error reporting.
    const KIND: EntityKind;

    /// Every status of this lifecycle, in pipeline order.
    fn all() -> &'static [Self];

    /// The transition table row: statuses reachable from `self` by `role`.
    fn allowed_next(self, role: Role) -> &'static [Self];

    /// Stable wire name of this status.
    fn name(self) -> &'static str;

    /// Whether a transition from `self` to `next` is permitted for `role`.
    ///
    /// Re-applying the current status is always permitted (idempotent
    /// no-op), for every status and every role.
    fn can_transition(self, next: Self, role: Role) -> bool {
        next == self || self.allowed_next(role).contains(&next)
    }

    /// Whether no role has any outgoing transition from `self`.
    fn is_terminal(self) -> bool {
        Role::ALL.iter().all(|role| self.allowed_next(*role).is_empty())
    }

    /// Check a transition, producing `InvalidTransition` on refusal.
    ///
    /// Callers must not mutate state when this returns an error.
    fn check(self, next: Self, role: Role) -> Result<(), FarmgateError> {
        if self.can_transition(next, role) {
            Ok(())
        } else {
            Err(FarmgateError::InvalidTransition {
                kind: Self::KIND,
                from: self.name(),
                to: next.name(),
                role,
            })
        }
    }
}

// =============================================================================
// ORDER TABLE
// =============================================================================

impl Lifecycle for OrderStatus {
    const KIND: EntityKind = EntityKind::Order;

    fn all() -> &'static [Self] {
        &[
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ]
    }

    /// Forward-only pipeline, each hop gated to the role that performs
    /// the work. The buyer may cancel from any non-terminal status.
    fn allowed_next(self, role: Role) -> &'static [Self] {
        match (self, role) {
            (OrderStatus::Pending, Role::Farmer) => &[OrderStatus::Confirmed],
            (OrderStatus::Confirmed, Role::Farmer) => &[OrderStatus::Preparing],
            (OrderStatus::Preparing, Role::Logistics) => &[OrderStatus::Shipped],
            (OrderStatus::Shipped, Role::Logistics) => &[OrderStatus::Delivered],
            (OrderStatus::Delivered, Role::Buyer) => {
                &[OrderStatus::Completed, OrderStatus::Cancelled]
            }
            (
                OrderStatus::Pending
                | OrderStatus::Confirmed
                | OrderStatus::Preparing
                | OrderStatus::Shipped,
                Role::Buyer,
            ) => &[OrderStatus::Cancelled],
            _ => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

// =============================================================================
// PAYMENT TABLE
// =============================================================================

impl Lifecycle for PaymentStatus {
    const KIND: EntityKind = EntityKind::Payment;

    fn all() -> &'static [Self] {
        &[
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ]
    }

    /// The buyer settles (or fails and retries) payment; refunds are an
    /// admin reconciliation act. Refunded is terminal.
    fn allowed_next(self, role: Role) -> &'static [Self] {
        match (self, role) {
            (PaymentStatus::Pending, Role::Buyer) => &[PaymentStatus::Paid, PaymentStatus::Failed],
            (PaymentStatus::Failed, Role::Buyer) => &[PaymentStatus::Pending],
            (PaymentStatus::Paid, Role::Admin) => &[PaymentStatus::Refunded],
            _ => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

// =============================================================================
// PRODUCT TABLE
// =============================================================================

impl Lifecycle for ProductStatus {
    const KIND: EntityKind = EntityKind::Product;

    fn all() -> &'static [Self] {
        &[
            ProductStatus::Unapproved,
            ProductStatus::Approved,
            ProductStatus::Deleted,
        ]
    }

    /// Admin approves and rejects; rejection returns the product to
    /// unapproved, never to deleted. Deletion is open to the admin or
    /// the owning farmer (ownership enforced by `Session`).
    fn allowed_next(self, role: Role) -> &'static [Self] {
        match (self, role) {
            (ProductStatus::Unapproved, Role::Admin) => {
                &[ProductStatus::Approved, ProductStatus::Deleted]
            }
            (ProductStatus::Approved, Role::Admin) => {
                &[ProductStatus::Unapproved, ProductStatus::Deleted]
            }
            (ProductStatus::Unapproved | ProductStatus::Approved, Role::Farmer) => {
                &[ProductStatus::Deleted]
            }
            _ => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

// =============================================================================
// DOCUMENT TABLE
// =============================================================================

impl Lifecycle for VerificationStatus {
    const KIND: EntityKind = EntityKind::Document;

    fn all() -> &'static [Self] {
        &[
            VerificationStatus::Pending,
            VerificationStatus::Verified,
            VerificationStatus::Rejected,
        ]
    }

    /// Admin-only review; verified and rejected are terminal for this
    /// cycle (reopening is not modeled).
    fn allowed_next(self, role: Role) -> &'static [Self] {
        match (self, role) {
            (VerificationStatus::Pending, Role::Admin) => {
                &[VerificationStatus::Verified, VerificationStatus::Rejected]
            }
            _ => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

// =============================================================================
// NOTIFICATION TABLE
// =============================================================================

impl Lifecycle for NotificationState {
    const KIND: EntityKind = EntityKind::Notification;

    fn all() -> &'static [Self] {
        &[NotificationState::Unread, NotificationState::Read]
    }

    /// Monotonic unread → read for any role; the recipient gate lives in
    /// `Session`.
    fn allowed_next(self, _role: Role) -> &'static [Self] {
        match self {
            NotificationState::Unread => &[NotificationState::Read],
            NotificationState::Read => &[],
        }
    }

    fn name(self) -> &'static str {
        self.as_str()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_status_is_always_permitted() {
        for &status in OrderStatus::all() {
            for role in Role::ALL {
                assert!(status.can_transition(status, role));
            }
        }
    }

    #[test]
    fn farmer_confirms_buyer_does_not() {
        assert!(OrderStatus::Pending.can_transition(OrderStatus::Confirmed, Role::Farmer));
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Confirmed, Role::Buyer));
        assert!(!OrderStatus::Pending.can_transition(OrderStatus::Confirmed, Role::Admin));
    }

    #[test]
    fn buyer_cancels_from_every_non_terminal_status() {
        let non_terminal = [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ];
        for status in non_terminal {
            assert!(
                status.can_transition(OrderStatus::Cancelled, Role::Buyer),
                "buyer should be able to cancel from {status}"
            );
        }
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        for role in Role::ALL {
            assert!(OrderStatus::Completed.allowed_next(role).is_empty());
            assert!(OrderStatus::Cancelled.allowed_next(role).is_empty());
        }
    }

    #[test]
    fn pipeline_never_skips_a_hop() {
        // preparing -> delivered skips shipped; no role may do it
        for role in Role::ALL {
            assert!(!OrderStatus::Preparing.can_transition(OrderStatus::Delivered, role));
            assert!(!OrderStatus::Pending.can_transition(OrderStatus::Shipped, role));
        }
    }

    #[test]
    fn check_produces_invalid_transition() {
        let err = OrderStatus::Pending
            .check(OrderStatus::Shipped, Role::Logistics)
            .expect_err("skip must fail");
        let FarmgateError::InvalidTransition {
            kind, from, to, role,
        } = err
        else {
            unreachable!("unexpected error kind");
        };
        assert_eq!(kind, EntityKind::Order);
        assert_eq!(from, "pending");
        assert_eq!(to, "shipped");
        assert_eq!(role, Role::Logistics);
    }

    #[test]
    fn product_reject_returns_to_unapproved() {
        assert!(ProductStatus::Approved.can_transition(ProductStatus::Unapproved, Role::Admin));
        assert!(!ProductStatus::Approved.can_transition(ProductStatus::Unapproved, Role::Farmer));
    }

    #[test]
    fn product_delete_open_to_admin_and_farmer() {
        for status in [ProductStatus::Unapproved, ProductStatus::Approved] {
            assert!(status.can_transition(ProductStatus::Deleted, Role::Admin));
            assert!(status.can_transition(ProductStatus::Deleted, Role::Farmer));
            assert!(!status.can_transition(ProductStatus::Deleted, Role::Buyer));
        }
        assert!(ProductStatus::Deleted.is_terminal());
    }

    #[test]
    fn document_review_is_admin_only() {
        assert!(VerificationStatus::Pending.can_transition(VerificationStatus::Verified, Role::Admin));
        for role in [Role::Buyer, Role::Farmer, Role::Logistics] {
            assert!(!VerificationStatus::Pending.can_transition(VerificationStatus::Verified, role));
            assert!(!VerificationStatus::Pending.can_transition(VerificationStatus::Rejected, role));
        }
        assert!(VerificationStatus::Verified.is_terminal());
        assert!(VerificationStatus::Rejected.is_terminal());
    }

    #[test]
    fn payment_refund_is_admin_only() {
        assert!(PaymentStatus::Paid.can_transition(PaymentStatus::Refunded, Role::Admin));
        assert!(!PaymentStatus::Paid.can_transition(PaymentStatus::Refunded, Role::Buyer));
        assert!(PaymentStatus::Refunded.is_terminal());
    }

    #[test]
    fn payment_retry_loops_back_to_pending() {
        assert!(PaymentStatus::Failed.can_transition(PaymentStatus::Pending, Role::Buyer));
        assert!(!PaymentStatus::Failed.can_transition(PaymentStatus::Paid, Role::Buyer));
    }

    #[test]
    fn notification_read_is_monotonic() {
        for role in Role::ALL {
            assert!(NotificationState::Unread.can_transition(NotificationState::Read, role));
            assert!(!NotificationState::Read.can_transition(NotificationState::Unread, role));
        }
        assert!(NotificationState::Read.is_terminal());
    }
}
