//! # Lifecycle Events
//!
//! Every successful state-changing transition emits exactly one
//! `LifecycleEvent`. Idempotent re-applications of the current status
//! emit nothing, so the event log contains only real changes.
//!
//! The core records events; delivering them (push notifications, emails)
//! is the job of an external dispatcher behind the `Dispatcher` trait.

use crate::types::{Actor, EntityKind, FarmgateError};
use serde::{Deserialize, Serialize};

// =============================================================================
// LIFECYCLE EVENT
// =============================================================================

/// A recorded status change: which entity, from what, to what, by whom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Store-assigned monotonic sequence number.
    pub seq: u64,
    /// The kind of entity that changed.
    pub kind: EntityKind,
    /// The raw id of the entity that changed.
    pub entity_id: u64,
    /// Wire name of the status before the transition.
    pub old_status: String,
    /// Wire name of the status after the transition.
    pub new_status: String,
    /// The actor that requested the transition.
    pub actor: Actor,
    /// Caller-supplied unix milliseconds.
    pub timestamp_ms: u64,
}

impl LifecycleEvent {
    /// Build an event awaiting a sequence number (the store assigns it
    /// on append).
    #[must_use]
    pub fn pending(
        kind: EntityKind,
        entity_id: u64,
        old_status: &str,
        new_status: &str,
        actor: Actor,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            seq: 0,
            kind,
            entity_id,
            old_status: old_status.to_string(),
            new_status: new_status.to_string(),
            actor,
            timestamp_ms,
        }
    }
}

// =============================================================================
// DISPATCHER TRAIT
// =============================================================================

/// The interface between the lifecycle core and the notification world.
///
/// Dispatchers must be `Send + Sync` for thread safety.
///
/// # Extension Point
///
/// This trait is intentionally defined without in-crate implementations.
/// It serves as an extension point for external adapters (push gateways,
/// email senders, webhook fan-out) that consume lifecycle events. A
/// dispatch failure never rolls back the transition that produced the
/// event; the event is already durable in the store log.
pub trait Dispatcher: Send + Sync {
    /// Deliver one lifecycle event to the outside world.
    fn dispatch(&self, event: &LifecycleEvent) -> Result<(), FarmgateError>;
}

// =============================================================================
// TESTS
// =============================================================================
