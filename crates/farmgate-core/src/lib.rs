//! # farmgate-core
//!
//! The deterministic lifecycle engine for Farmgate - THE POLICY.
//!
//! This crate implements the CORE policy layer for a farm-to-table
//! marketplace: who may move an order, payment, product listing,
//! verification document, or notification from one status to the next,
//! and the audit trail every such move leaves behind.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is the ONLY place where lifecycle rules exist (the HTTP and CLI
//!   layers never re-implement a transition table)
//! - Is deterministic: BTreeMap iteration, integer cents, no floats,
//!   caller-supplied timestamps
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod entity;
pub mod event;
pub mod export;
pub mod policy;
pub mod primitives;
pub mod registry;
pub mod session;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Actor, ActorId, DocumentId, EntityKind, FarmgateError, NotificationId, NotificationState,
    OrderId, OrderStatus, PaymentStatus, ProductId, ProductStatus, Role, VerificationStatus,
};

// =============================================================================
// RE-EXPORTS: Lifecycle Engine
// =============================================================================

pub use entity::{Notification, Order, Product, VerificationDocument};
pub use event::{Dispatcher, LifecycleEvent};
pub use export::{
    CanonicalHeader, MarketSnapshot, canonical_checksum, export_canonical, import_canonical,
    verify_canonical,
};
pub use policy::Lifecycle;
pub use registry::{MarketStore, Registry, StoreCounts};
pub use session::{Session, StorageBackend};
pub use storage::RedbStore;
