//! # Farmgate HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Record counts per table
//! - `GET /events?since=` - Lifecycle event log
//! - `POST /orders`, `GET /orders`, `GET /orders/{id}` - Orders
//! - `POST /orders/{id}/transition` - Move an order along its pipeline
//! - `POST /orders/{id}/payment` - Move an order's payment status
//! - `POST /products`, `GET /products` - Product listings
//! - `POST /products/{id}/review`, `POST /products/{id}/delete`
//! - `POST /documents`, `POST /documents/{id}/review`
//! - `POST /notifications`, `POST /notifications/{id}/read`,
//!   `POST /notifications/{id}/delete`
//! - `POST /export` - Canonical snapshot export
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `FARMGATE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `FARMGATE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `FARMGATE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::get_api_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handlers and types for integration tests (via `farmgate::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    create_document_handler, create_notification_handler, create_order_handler,
    create_product_handler, delete_notification_handler, delete_product_handler, events_handler,
    export_handler, get_order_handler, health_handler, list_orders_handler, list_products_handler,
    read_notification_handler, review_document_handler, review_product_handler, status_handler,
    transition_order_handler, transition_payment_handler,
};
#[allow(unused_imports)]
pub use types::{
    ActorJson, CreateDocumentRequest, CreateNotificationRequest, CreateOrderRequest,
    CreateProductRequest, DocumentJson, EventJson, ExportResponse, HealthResponse, ListResponse,
    NotificationJson, OrderJson, ProductJson, RecordResponse, ReviewRequest, StatusResponse,
    TransitionRequest, TransitionResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use farmgate_core::{Dispatcher, FarmgateError, LifecycleEvent, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// EVENT DISPATCH
// =============================================================================

/// In-process event dispatcher: emits every successful lifecycle event
/// as a structured tracing record. This is the hook where an outbound
/// notification channel would attach.
#[derive(Debug, Default)]
pub struct TracingDispatcher;

impl Dispatcher for TracingDispatcher {
    fn dispatch(&self, event: &LifecycleEvent) -> Result<(), FarmgateError> {
        tracing::info!(
            event = "lifecycle_transition",
            seq = event.seq,
            entity = %event.kind,
            entity_id = event.entity_id,
            old_status = %event.old_status,
            new_status = %event.new_status,
            actor_id = event.actor.id.0,
            actor_role = %event.actor.role,
            "{} {} moved {} -> {}",
            event.kind,
            event.entity_id,
            event.old_status,
            event.new_status
        );
        Ok(())
    }
}

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the lifecycle session.
#[derive(Clone)]
pub struct AppState {
    /// The session owning the store.
    pub session: Arc<RwLock<Session>>,
    /// Consumer for successful lifecycle events.
    pub dispatcher: Arc<dyn Dispatcher>,
}

impl AppState {
    /// Create new app state with a session and the default tracing
    /// dispatcher.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            dispatcher: Arc::new(TracingDispatcher),
        }
    }

    /// Create new app state with a custom event dispatcher.
    #[must_use]
    pub fn with_dispatcher(session: Session, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            dispatcher,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `FARMGATE_CORS_ORIGINS` environment variable:
/// - If "*": allows all origins (development mode - use with caution!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
///
/// # Security Note
///
/// The default is restrictive (localhost only). Set `FARMGATE_CORS_ORIGINS=*`
/// explicitly only for development or if you understand the security implications.
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("FARMGATE_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            // Explicit wildcard - warn about security implications
            tracing::warn!(
                "CORS: Allowing ALL origins (FARMGATE_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            // Parse comma-separated origins
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in FARMGATE_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            // No configuration - default to localhost only (restrictive)
            tracing::info!("CORS: No FARMGATE_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against DoS (if enabled)
/// 4. Authentication - validates API key (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    // Check if rate limiting is enabled
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    // Check if authentication is enabled
    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "⚠️  API key authentication DISABLED - all endpoints are publicly accessible! \
             Set FARMGATE_API_KEY environment variable to enable authentication."
        );
    }

    // Build base router with routes
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/events", get(handlers::events_handler))
        .route(
            "/orders",
            get(handlers::list_orders_handler).post(handlers::create_order_handler),
        )
        .route("/orders/{id}", get(handlers::get_order_handler))
        .route(
            "/orders/{id}/transition",
            post(handlers::transition_order_handler),
        )
        .route(
            "/orders/{id}/payment",
            post(handlers::transition_payment_handler),
        )
        .route(
            "/products",
            get(handlers::list_products_handler).post(handlers::create_product_handler),
        )
        .route(
            "/products/{id}/review",
            post(handlers::review_product_handler),
        )
        .route(
            "/products/{id}/delete",
            post(handlers::delete_product_handler),
        )
        .route("/documents", post(handlers::create_document_handler))
        .route(
            "/documents/{id}/review",
            post(handlers::review_document_handler),
        )
        .route(
            "/notifications",
            post(handlers::create_notification_handler),
        )
        .route(
            "/notifications/{id}/read",
            post(handlers::read_notification_handler),
        )
        .route(
            "/notifications/{id}/delete",
            post(handlers::delete_notification_handler),
        )
        .route("/export", post(handlers::export_handler));

    // Apply authentication middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    // Apply rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Apply CORS, body limit, and tracing (outermost layers)
    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, session: Session) -> Result<(), FarmgateError> {
    let state = AppState::new(session);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| FarmgateError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Farmgate HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| FarmgateError::IoError(format!("Server error: {}", e)))
}
