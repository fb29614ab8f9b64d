//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use farmgate_core::{
    Actor, ActorId, FarmgateError, LifecycleEvent, Notification, Order, Product, Role,
    VerificationDocument,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Store status response: record counts per table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub orders: usize,
    pub products: usize,
    pub documents: usize,
    pub notifications: usize,
    pub events: usize,
}

// =============================================================================
// ACTOR ENVELOPE
// =============================================================================

/// The acting party, carried by every mutating request.
///
/// Identity is client-asserted here; authenticating the caller is the
/// API key layer's job, mapping keys to actors is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorJson {
    pub actor_id: u64,
    pub role: String,
}

impl ActorJson {
    /// Parse into a core `Actor`, validating the role name.
    pub fn to_actor(&self) -> Result<Actor, FarmgateError> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| FarmgateError::InvalidInput(format!("unknown role: {}", self.role)))?;
        Ok(Actor::new(ActorId(self.actor_id), role))
    }
}

// =============================================================================
// CREATE REQUESTS
// =============================================================================

/// Order creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub buyer_id: u64,
    pub farmer_id: u64,
    pub total_cents: u64,
}

/// Product listing creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub farmer_id: u64,
    pub name: String,
    pub unit_price_cents: u64,
}

/// Verification document submission request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub owner_id: u64,
    pub owner_role: String,
    pub label: String,
}

/// Notification push request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_id: u64,
    pub body: String,
}

// =============================================================================
// TRANSITION REQUESTS
// =============================================================================

/// Status transition request (orders and payments): the target status
/// by wire name plus the acting party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    #[serde(flatten)]
    pub actor: ActorJson,
    pub target: String,
}

/// Review decision request (products and documents).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    #[serde(flatten)]
    pub actor: ActorJson,
    /// `approve`/`reject` for products, `verify`/`reject` for documents.
    pub decision: String,
}

/// Bare actor request (delete, read).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRequest {
    #[serde(flatten)]
    pub actor: ActorJson,
}

// =============================================================================
// ENTITY JSON
// =============================================================================

/// Order wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderJson {
    pub id: u64,
    pub buyer_id: u64,
    pub farmer_id: u64,
    pub order_status: String,
    pub order_status_label: String,
    pub payment_status: String,
    pub payment_status_label: String,
    pub total_cents: u64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Order> for OrderJson {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.0,
            buyer_id: order.buyer.0,
            farmer_id: order.farmer.0,
            order_status: order.order_status.as_str().to_string(),
            order_status_label: order.order_status.label().to_string(),
            payment_status: order.payment_status.as_str().to_string(),
            payment_status_label: order.payment_status.label().to_string(),
            total_cents: order.total_cents,
            created_at_ms: order.created_at_ms,
            updated_at_ms: order.updated_at_ms,
        }
    }
}

/// Product wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductJson {
    pub id: u64,
    pub farmer_id: u64,
    pub name: String,
    pub status: String,
    pub status_label: String,
    pub unit_price_cents: u64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Product> for ProductJson {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.0,
            farmer_id: product.farmer.0,
            name: product.name.clone(),
            status: product.status.as_str().to_string(),
            status_label: product.status.label().to_string(),
            unit_price_cents: product.unit_price_cents,
            created_at_ms: product.created_at_ms,
            updated_at_ms: product.updated_at_ms,
        }
    }
}

/// Verification document wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentJson {
    pub id: u64,
    pub owner_id: u64,
    pub owner_role: String,
    pub label: String,
    pub status: String,
    pub status_label: String,
    pub submitted_at_ms: u64,
    pub reviewed_at_ms: Option<u64>,
}

impl From<&VerificationDocument> for DocumentJson {
    fn from(document: &VerificationDocument) -> Self {
        Self {
            id: document.id.0,
            owner_id: document.owner.0,
            owner_role: document.owner_role.as_str().to_string(),
            label: document.label.clone(),
            status: document.status.as_str().to_string(),
            status_label: document.status.label().to_string(),
            submitted_at_ms: document.submitted_at_ms,
            reviewed_at_ms: document.reviewed_at_ms,
        }
    }
}

/// Notification wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJson {
    pub id: u64,
    pub recipient_id: u64,
    pub body: String,
    pub state: String,
    pub created_at_ms: u64,
}

impl From<&Notification> for NotificationJson {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.0,
            recipient_id: notification.recipient.0,
            body: notification.body.clone(),
            state: notification.state.as_str().to_string(),
            created_at_ms: notification.created_at_ms,
        }
    }
}

/// Lifecycle event wire representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventJson {
    pub seq: u64,
    pub entity: String,
    pub entity_id: u64,
    pub old_status: String,
    pub new_status: String,
    pub actor_id: u64,
    pub actor_role: String,
    pub timestamp_ms: u64,
}

impl From<&LifecycleEvent> for EventJson {
    fn from(event: &LifecycleEvent) -> Self {
        Self {
            seq: event.seq,
            entity: event.kind.as_str().to_string(),
            entity_id: event.entity_id,
            old_status: event.old_status.clone(),
            new_status: event.new_status.clone(),
            actor_id: event.actor.id.0,
            actor_role: event.actor.role.as_str().to_string(),
            timestamp_ms: event.timestamp_ms,
        }
    }
}

// =============================================================================
// RESPONSE ENVELOPES
// =============================================================================

/// Generic success/error envelope for a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> RecordResponse<T> {
    pub fn success(record: T) -> Self {
        Self {
            success: true,
            record: Some(record),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            record: None,
            error: Some(msg.into()),
        }
    }
}

/// Generic success/error envelope for a list of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub records: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ListResponse<T> {
    pub fn success(records: Vec<T>) -> Self {
        Self {
            success: true,
            records,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            records: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Transition outcome envelope.
///
/// `changed: false` with `success: true` is the idempotent no-op: the
/// entity was already at the requested status and no event was logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransitionResponse {
    pub fn applied(event: EventJson) -> Self {
        Self {
            success: true,
            changed: true,
            event: Some(event),
            error: None,
        }
    }

    pub fn noop() -> Self {
        Self {
            success: true,
            changed: false,
            event: None,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            changed: false,
            event: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub checksum: Option<u64>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>, checksum: u64) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            checksum: Some(checksum),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}
