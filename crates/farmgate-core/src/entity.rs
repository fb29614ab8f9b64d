//! # Entity Records
//!
//! The lifecycle-managed records of the marketplace: orders, product
//! listings, verification documents and notifications.
//!
//! Records carry their status fields but never mutate them directly;
//! every status change flows through the policy engine via `Session`.
//! Timestamps are caller-supplied unix milliseconds so the core stays
//! clock-free and deterministic.

use crate::types::{
    ActorId, DocumentId, NotificationId, NotificationState, OrderId, OrderStatus, PaymentStatus,
    ProductId, ProductStatus, Role, VerificationStatus,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// ORDER
// =============================================================================

/// A marketplace order, owned by a buyer and fulfilled by a farmer
/// (with the shipping hops performed by logistics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer: ActorId,
    pub farmer: ActorId,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Total in integer cents. Never floating point.
    pub total_cents: u64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Order {
    /// Create a new pending, unpaid order.
    #[must_use]
    pub const fn new(
        id: OrderId,
        buyer: ActorId,
        farmer: ActorId,
        total_cents: u64,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            buyer,
            farmer,
            order_status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_cents,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}

// =============================================================================
// PRODUCT
// =============================================================================

/// A product listing, owned by the selling farmer.
///
/// Created unapproved; only approved products are visible to buyers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub farmer: ActorId,
    pub name: String,
    pub status: ProductStatus,
    /// Unit price in integer cents.
    pub unit_price_cents: u64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Product {
    /// Create a new unapproved listing.
    #[must_use]
    pub fn new(
        id: ProductId,
        farmer: ActorId,
        name: impl Into<String>,
        unit_price_cents: u64,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            farmer,
            name: name.into(),
            status: ProductStatus::Unapproved,
            unit_price_cents,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }
}

// =============================================================================
// VERIFICATION DOCUMENT
// =============================================================================

/// A document submitted by a farmer or logistics rider for verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationDocument {
    pub id: DocumentId,
    pub owner: ActorId,
    /// The role the document verifies the owner for (farmer or logistics).
    pub owner_role: Role,
    pub label: String,
    pub status: VerificationStatus,
    pub submitted_at_ms: u64,
    /// Set on the verify/reject transition, never before.
    pub reviewed_at_ms: Option<u64>,
}

impl VerificationDocument {
    /// Create a new pending document.
    #[must_use]
    pub fn new(
        id: DocumentId,
        owner: ActorId,
        owner_role: Role,
        label: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            owner,
            owner_role,
            label: label.into(),
            status: VerificationStatus::Pending,
            submitted_at_ms: now_ms,
            reviewed_at_ms: None,
        }
    }
}

// =============================================================================
// NOTIFICATION
// =============================================================================

/// A notification delivered to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: ActorId,
    pub body: String,
    pub state: NotificationState,
    pub created_at_ms: u64,
}

impl Notification {
    /// Create a new unread notification.
    #[must_use]
    pub fn new(id: NotificationId, recipient: ActorId, body: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id,
            recipient,
            body: body.into(),
            state: NotificationState::Unread,
            created_at_ms: now_ms,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_starts_pending_and_unpaid() {
        let order = Order::new(OrderId(1), ActorId(10), ActorId(20), 4_500, 1_000);
        assert_eq!(order.order_status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.created_at_ms, order.updated_at_ms);
    }

    #[test]
    fn new_product_starts_unapproved() {
        let product = Product::new(ProductId(1), ActorId(20), "Valencia oranges", 350, 1_000);
        assert_eq!(product.status, ProductStatus::Unapproved);
        assert!(!product.status.is_approved());
    }

    #[test]
    fn new_document_has_no_review_timestamp() {
        let doc = VerificationDocument::new(
            DocumentId(1),
            ActorId(20),
            Role::Farmer,
            "business licence",
            1_000,
        );
        assert_eq!(doc.status, VerificationStatus::Pending);
        assert!(doc.reviewed_at_ms.is_none());
    }
}
