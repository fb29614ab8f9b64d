//! # Core Type Definitions
//!
//! This module contains all core types for the Farmgate lifecycle engine:
//! - Entity identifiers (`OrderId`, `ProductId`, `DocumentId`, `NotificationId`, `ActorId`)
//! - Actor representation (`Actor`, `Role`)
//! - Status enumerations for every lifecycle-managed entity
//! - Error types (`FarmgateError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point; money is cents)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Carry a stable wire name (`as_str`) and a human label (`label`),
//!   so status presentation lives in exactly one place

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ENTITY IDENTIFIERS
// =============================================================================

/// Unique identifier for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(pub u64);

/// Unique identifier for a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub u64);

/// Unique identifier for a verification document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

/// Unique identifier for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

/// Unique identifier for a platform user (buyer, farmer, rider or admin).
///
/// Identity resolution happens outside the core; the policy engine only
/// ever compares ids for ownership checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

// =============================================================================
// ACTOR & ROLE
// =============================================================================

/// The role of the user requesting a transition.
///
/// Roles gate permission in the transition tables; ownership (which buyer,
/// which farmer) is checked separately by the `Session` once the entity
/// record is in hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Farmer,
    Logistics,
    Admin,
}

impl Role {
    /// Every role, in deterministic order. Used by terminality checks.
    pub const ALL: [Role; 4] = [Role::Buyer, Role::Farmer, Role::Logistics, Role::Admin];

    /// Stable wire name for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Farmer => "farmer",
            Role::Logistics => "logistics",
            Role::Admin => "admin",
        }
    }

    /// Parse a wire name back into a role.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(Role::Buyer),
            "farmer" => Some(Role::Farmer),
            "logistics" => Some(Role::Logistics),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated actor: who is asking, and in what role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The platform user id.
    pub id: ActorId,
    /// The role the request is made under.
    pub role: Role,
}

impl Actor {
    /// Create a new actor.
    #[must_use]
    pub const fn new(id: ActorId, role: Role) -> Self {
        Self { id, role }
    }
}

// =============================================================================
// ENTITY KIND
// =============================================================================

/// The kind of lifecycle-managed entity, used in errors and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Order,
    Payment,
    Product,
    Document,
    Notification,
}

impl EntityKind {
    /// Stable wire name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Order => "order",
            EntityKind::Payment => "payment",
            EntityKind::Product => "product",
            EntityKind::Document => "document",
            EntityKind::Notification => "notification",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// STATUS ENUMERATIONS
// =============================================================================

/// Fulfilment status of an order.
///
/// Advances forward through the pipeline
/// pending → confirmed → preparing → shipped → delivered → completed,
/// or moves to cancelled from any non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Parse a wire name back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment status of an order. Tracked independently of fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Payment pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Payment failed",
            PaymentStatus::Refunded => "Refunded",
        }
    }

    /// Parse a wire name back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval status of a product listing.
///
/// Products are created unapproved; an admin approves or rejects them.
/// Rejection returns an approved product to unapproved rather than
/// deleting it. Deletion is a soft terminal state so the record (and its
/// event history) survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Unapproved,
    Approved,
    Deleted,
}

impl ProductStatus {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Unapproved => "unapproved",
            ProductStatus::Approved => "approved",
            ProductStatus::Deleted => "deleted",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ProductStatus::Unapproved => "Awaiting approval",
            ProductStatus::Approved => "Approved",
            ProductStatus::Deleted => "Deleted",
        }
    }

    /// Parse a wire name back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unapproved" => Some(ProductStatus::Unapproved),
            "approved" => Some(ProductStatus::Approved),
            "deleted" => Some(ProductStatus::Deleted),
            _ => None,
        }
    }

    /// Whether the product is visible to buyers.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, ProductStatus::Approved)
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification status of a seller or rider document.
///
/// Terminal once verified or rejected; reopening is not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "Under review",
            VerificationStatus::Verified => "Verified",
            VerificationStatus::Rejected => "Rejected",
        }
    }

    /// Parse a wire name back into a status.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(VerificationStatus::Pending),
            "verified" => Some(VerificationStatus::Verified),
            "rejected" => Some(VerificationStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read state of a notification. Monotonic: unread → read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Unread,
    Read,
}

impl NotificationState {
    /// Stable wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            NotificationState::Unread => "unread",
            NotificationState::Read => "read",
        }
    }

    /// Parse a wire name back into a state.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unread" => Some(NotificationState::Unread),
            "read" => Some(NotificationState::Read),
            _ => None,
        }
    }
}

impl std::fmt::Display for NotificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Farmgate system.
///
/// - No silent failures
/// - Use `Result<T, FarmgateError>` for fallible operations
/// - The policy engine never panics; all errors are recoverable
/// - A failed check never leaves a partially applied transition
#[derive(Debug, Error)]
pub enum FarmgateError {
    /// The target status is not reachable from the current status for
    /// the acting role. The entity is left unchanged.
    #[error("invalid transition for {kind}: {from} -> {to} as {role}")]
    InvalidTransition {
        kind: EntityKind,
        from: &'static str,
        to: &'static str,
        role: Role,
    },

    /// The requested entity id is unknown.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: u64 },

    /// The actor's role permits the transition but the actor is not the
    /// owning party of the entity.
    #[error("actor does not own {kind} {id}")]
    NotOwner { kind: EntityKind, id: u64 },

    /// Input failed validation before reaching the store.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A serialization error occurred.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
