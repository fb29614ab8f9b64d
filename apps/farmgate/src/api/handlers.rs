//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every mutating handler follows the same shape: parse the actor and
//! target, take the session write lock, let the core decide, map the
//! outcome to an HTTP status. The handlers never encode transition
//! rules themselves.

use super::{
    AppState,
    types::{
        ActorRequest, CreateDocumentRequest, CreateNotificationRequest, CreateOrderRequest,
        CreateProductRequest, DocumentJson, EventJson, ExportResponse, HealthResponse,
        ListResponse, NotificationJson, OrderJson, ProductJson, RecordResponse, ReviewRequest,
        StatusResponse, TransitionRequest, TransitionResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use farmgate_core::{
    ActorId, DocumentId, FarmgateError, NotificationId, OrderId, OrderStatus, PaymentStatus,
    ProductId, ProductStatus, Role,
    export::{export_canonical, verify_canonical},
};
use serde::Deserialize;

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// Wall-clock milliseconds since the Unix epoch.
///
/// The core is clock-free; the binary supplies every timestamp.
fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Map a core error to an HTTP status code.
fn error_status(error: &FarmgateError) -> StatusCode {
    match error {
        FarmgateError::InvalidTransition { .. } => StatusCode::CONFLICT,
        FarmgateError::NotOwner { .. } => StatusCode::FORBIDDEN,
        FarmgateError::NotFound { .. } => StatusCode::NOT_FOUND,
        FarmgateError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FarmgateError::SerializationError(_)
        | FarmgateError::DeserializationError(_)
        | FarmgateError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Fold a `Result<Option<LifecycleEvent>>` transition outcome into the
/// HTTP envelope, dispatching the event on a real change.
fn transition_outcome(
    state: &AppState,
    outcome: Result<Option<farmgate_core::LifecycleEvent>, FarmgateError>,
) -> (StatusCode, Json<TransitionResponse>) {
    match outcome {
        Ok(Some(event)) => {
            if let Err(e) = state.dispatcher.dispatch(&event) {
                tracing::warn!("Event dispatch failed: {}", e);
            }
            (
                StatusCode::OK,
                Json(TransitionResponse::applied(EventJson::from(&event))),
            )
        }
        Ok(None) => (StatusCode::OK, Json(TransitionResponse::noop())),
        Err(e) => (error_status(&e), Json(TransitionResponse::error(e.to_string()))),
    }
}

// =============================================================================
// HEALTH / STATUS / EVENTS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Get store status (record counts per table).
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.metrics() {
        Ok(counts) => (
            StatusCode::OK,
            Json(RecordResponse::success(StatusResponse {
                orders: counts.orders,
                products: counts.products,
                documents: counts.documents,
                notifications: counts.notifications,
                events: counts.events,
            })),
        ),
        Err(e) => (error_status(&e), Json(RecordResponse::error(e.to_string()))),
    }
}

/// Query parameters for the event log.
#[derive(Debug, Deserialize)]
pub struct EventsParams {
    /// Return events with sequence number strictly greater than this.
    #[serde(default)]
    pub since: u64,
}

/// Read the lifecycle event log.
pub async fn events_handler(
    State(state): State<AppState>,
    Query(params): Query<EventsParams>,
) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.events_since(params.since) {
        Ok(events) => (
            StatusCode::OK,
            Json(ListResponse::success(
                events.iter().map(EventJson::from).collect(),
            )),
        ),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

// =============================================================================
// ORDER HANDLERS
// =============================================================================

/// Create a new pending order.
pub async fn create_order_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    let mut session = state.session.write().await;
    match session.create_order(
        ActorId(request.buyer_id),
        ActorId(request.farmer_id),
        request.total_cents,
        now_ms(),
    ) {
        Ok(order) => (
            StatusCode::OK,
            Json(RecordResponse::success(OrderJson::from(&order))),
        ),
        Err(e) => (error_status(&e), Json(RecordResponse::error(e.to_string()))),
    }
}

/// Fetch a single order.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let session = state.session.read().await;
    match session.get_order(OrderId(id)) {
        Ok(Some(order)) => (
            StatusCode::OK,
            Json(RecordResponse::success(OrderJson::from(&order))),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(RecordResponse::error(format!("order {} not found", id))),
        ),
        Err(e) => (error_status(&e), Json(RecordResponse::error(e.to_string()))),
    }
}

/// Optional status filter for list endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

/// List orders, optionally filtered by status.
pub async fn list_orders_handler(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> impl IntoResponse {
    let status = match filter.status.as_deref() {
        Some(s) => match OrderStatus::parse(s) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ListResponse::error(format!("unknown order status: {}", s))),
                );
            }
        },
        None => None,
    };
    let session = state.session.read().await;
    match session.list_orders(status) {
        Ok(orders) => (
            StatusCode::OK,
            Json(ListResponse::success(
                orders.iter().map(OrderJson::from).collect(),
            )),
        ),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Move an order to a new fulfilment status.
pub async fn transition_order_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<TransitionRequest>,
) -> impl IntoResponse {
    let actor = match request.actor.to_actor() {
        Ok(actor) => actor,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(e.to_string())),
            );
        }
    };
    let Some(target) = OrderStatus::parse(&request.target) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(TransitionResponse::error(format!(
                "unknown order status: {}",
                request.target
            ))),
        );
    };

    let mut session = state.session.write().await;
    let outcome = session.transition_order(OrderId(id), target, actor, now_ms());
    transition_outcome(&state, outcome)
}

/// Move an order's payment status.
pub async fn transition_payment_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<TransitionRequest>,
) -> impl IntoResponse {
    let actor = match request.actor.to_actor() {
        Ok(actor) => actor,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(e.to_string())),
            );
        }
    };
    let Some(target) = PaymentStatus::parse(&request.target) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(TransitionResponse::error(format!(
                "unknown payment status: {}",
                request.target
            ))),
        );
    };

    let mut session = state.session.write().await;
    let outcome = session.transition_payment(OrderId(id), target, actor, now_ms());
    transition_outcome(&state, outcome)
}

// =============================================================================
// PRODUCT HANDLERS
// =============================================================================

/// Create a new unapproved product listing.
pub async fn create_product_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> impl IntoResponse {
    let mut session = state.session.write().await;
    match session.create_product(
        ActorId(request.farmer_id),
        &request.name,
        request.unit_price_cents,
        now_ms(),
    ) {
        Ok(product) => (
            StatusCode::OK,
            Json(RecordResponse::success(ProductJson::from(&product))),
        ),
        Err(e) => (error_status(&e), Json(RecordResponse::error(e.to_string()))),
    }
}

/// List products, optionally filtered by status.
pub async fn list_products_handler(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> impl IntoResponse {
    let status = match filter.status.as_deref() {
        Some(s) => match ProductStatus::parse(s) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ListResponse::error(format!(
                        "unknown product status: {}",
                        s
                    ))),
                );
            }
        },
        None => None,
    };
    let session = state.session.read().await;
    match session.list_products(status) {
        Ok(products) => (
            StatusCode::OK,
            Json(ListResponse::success(
                products.iter().map(ProductJson::from).collect(),
            )),
        ),
        Err(e) => (error_status(&e), Json(ListResponse::error(e.to_string()))),
    }
}

/// Approve or reject a product listing.
pub async fn review_product_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ReviewRequest>,
) -> impl IntoResponse {
    let actor = match request.actor.to_actor() {
        Ok(actor) => actor,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(e.to_string())),
            );
        }
    };
    let approve = match request.decision.as_str() {
        "approve" => true,
        "reject" => false,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(format!(
                    "unknown decision: {} (use approve or reject)",
                    other
                ))),
            );
        }
    };

    let mut session = state.session.write().await;
    let outcome = session.review_product(ProductId(id), approve, actor, now_ms());
    transition_outcome(&state, outcome)
}

/// Soft-delete a product listing.
pub async fn delete_product_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> impl IntoResponse {
    let actor = match request.actor.to_actor() {
        Ok(actor) => actor,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(e.to_string())),
            );
        }
    };

    let mut session = state.session.write().await;
    let outcome = session.delete_product(ProductId(id), actor, now_ms());
    transition_outcome(&state, outcome)
}

// =============================================================================
// DOCUMENT HANDLERS
// =============================================================================

/// Submit a verification document.
pub async fn create_document_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> impl IntoResponse {
    let Some(owner_role) = Role::parse(&request.owner_role) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(RecordResponse::error(format!(
                "unknown role: {}",
                request.owner_role
            ))),
        );
    };
    let mut session = state.session.write().await;
    match session.submit_document(
        ActorId(request.owner_id),
        owner_role,
        &request.label,
        now_ms(),
    ) {
        Ok(document) => (
            StatusCode::OK,
            Json(RecordResponse::success(DocumentJson::from(&document))),
        ),
        Err(e) => (error_status(&e), Json(RecordResponse::error(e.to_string()))),
    }
}

/// Verify or reject a pending document.
pub async fn review_document_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ReviewRequest>,
) -> impl IntoResponse {
    let actor = match request.actor.to_actor() {
        Ok(actor) => actor,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(e.to_string())),
            );
        }
    };
    let verify = match request.decision.as_str() {
        "verify" => true,
        "reject" => false,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(format!(
                    "unknown decision: {} (use verify or reject)",
                    other
                ))),
            );
        }
    };

    let mut session = state.session.write().await;
    let outcome = session.review_document(DocumentId(id), verify, actor, now_ms());
    transition_outcome(&state, outcome)
}

// =============================================================================
// NOTIFICATION HANDLERS
// =============================================================================

/// Push a notification to a recipient.
pub async fn create_notification_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateNotificationRequest>,
) -> impl IntoResponse {
    let mut session = state.session.write().await;
    match session.push_notification(ActorId(request.recipient_id), &request.body, now_ms()) {
        Ok(notification) => (
            StatusCode::OK,
            Json(RecordResponse::success(NotificationJson::from(
                &notification,
            ))),
        ),
        Err(e) => (error_status(&e), Json(RecordResponse::error(e.to_string()))),
    }
}

/// Mark a notification as read.
pub async fn read_notification_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> impl IntoResponse {
    let actor = match request.actor.to_actor() {
        Ok(actor) => actor,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransitionResponse::error(e.to_string())),
            );
        }
    };

    let mut session = state.session.write().await;
    let outcome = session.read_notification(NotificationId(id), actor, now_ms());
    transition_outcome(&state, outcome)
}

/// Delete a notification.
pub async fn delete_notification_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<ActorRequest>,
) -> impl IntoResponse {
    let actor = match request.actor.to_actor() {
        Ok(actor) => actor,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(RecordResponse::error(e.to_string())),
            );
        }
    };

    let mut session = state.session.write().await;
    match session.delete_notification(NotificationId(id), actor) {
        Ok(removed) => (StatusCode::OK, Json(RecordResponse::success(removed))),
        Err(e) => (error_status(&e), Json(RecordResponse::error(e.to_string()))),
    }
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the store in canonical format.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;

    let snapshot = match session.export_snapshot() {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ExportResponse::error(format!(
                    "Failed to build snapshot: {}",
                    e
                ))),
            );
        }
    };

    match export_canonical(&snapshot) {
        Ok(data) => {
            // Checksum reported to the client is the one embedded in the
            // file header, re-read so the two can never disagree.
            let checksum = match verify_canonical(&data) {
                Ok(header) => header.checksum,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ExportResponse::error(format!("Export invalid: {}", e))),
                    );
                }
            };
            (
                StatusCode::OK,
                Json(ExportResponse::success(data, checksum)),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}
