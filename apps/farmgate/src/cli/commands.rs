//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use farmgate_core::{
    Actor, ActorId, DocumentId, FarmgateError, LifecycleEvent, OrderId, OrderStatus, PaymentStatus,
    ProductId, Role, Session,
    export::{export_canonical, import_canonical, verify_canonical},
};
use std::path::PathBuf;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for import (500 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_IMPORT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Wall-clock milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Parse an actor id + role name pair from CLI arguments.
fn parse_actor(actor: u64, role: &str) -> Result<Actor, FarmgateError> {
    let role = Role::parse(role)
        .ok_or_else(|| FarmgateError::InvalidInput(format!("unknown role: {}", role)))?;
    Ok(Actor::new(ActorId(actor), role))
}

/// Validate file size before reading.
fn validate_file_size(path: &PathBuf, max_size: u64) -> Result<(), FarmgateError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| FarmgateError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(FarmgateError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path to resolve symlinks and "..", ensures it
/// exists and is a regular file. This prevents path traversal where a
/// path like "../../../etc/passwd" reaches outside the working tree.
fn validate_file_path(path: &std::path::Path) -> Result<PathBuf, FarmgateError> {
    let canonical = path.canonicalize().map_err(|e| {
        FarmgateError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(FarmgateError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output file path: the parent directory must exist.
fn validate_output_path(path: &std::path::Path) -> Result<PathBuf, FarmgateError> {
    let parent = path.parent().unwrap_or(std::path::Path::new("."));

    let canonical_parent = parent.canonicalize().map_err(|e| {
        FarmgateError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(FarmgateError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| FarmgateError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &PathBuf,
    backend: &str,
    host: &str,
    port: u16,
) -> Result<(), FarmgateError> {
    let session = load_or_create_session(db_path, backend)?;

    println!("Farmgate Marketplace Lifecycle Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {}", backend);
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  GET  /health                      - Health check");
    println!("  GET  /status                      - Record counts");
    println!("  GET  /events?since=N              - Lifecycle event log");
    println!("  POST /orders                      - Create an order");
    println!("  POST /orders/{{id}}/transition      - Move an order");
    println!("  POST /orders/{{id}}/payment         - Move a payment");
    println!("  POST /products                    - Create a listing");
    println!("  POST /products/{{id}}/review        - Review a listing");
    println!("  POST /documents/{{id}}/review       - Review a document");
    println!("  POST /export                      - Canonical export");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, session).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store status.
pub fn cmd_status(db_path: &PathBuf, backend: &str, json_mode: bool) -> Result<(), FarmgateError> {
    let session = load_or_create_session(db_path, backend)?;
    let counts = session.metrics()?;

    if json_mode {
        let output = serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend,
            "orders": counts.orders,
            "products": counts.products,
            "documents": counts.documents,
            "notifications": counts.notifications,
            "events": counts.events
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Farmgate Store Status");
    println!("=====================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Orders:        {}", counts.orders);
    println!("Products:      {}", counts.products);
    println!("Documents:     {}", counts.documents);
    println!("Notifications: {}", counts.notifications);
    println!("Events:        {}", counts.events);

    Ok(())
}

// =============================================================================
// CREATE ORDER COMMAND
// =============================================================================

/// Create a new pending order.
pub fn cmd_create_order(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    buyer: u64,
    farmer: u64,
    total_cents: u64,
) -> Result<(), FarmgateError> {
    let mut session = load_or_create_session(db_path, backend)?;
    let order = session.create_order(ActorId(buyer), ActorId(farmer), total_cents, now_ms())?;
    save_session(&session, db_path)?;

    if json_mode {
        let output = serde_json::json!({
            "id": order.id.0,
            "buyer_id": order.buyer.0,
            "farmer_id": order.farmer.0,
            "order_status": order.order_status.as_str(),
            "payment_status": order.payment_status.as_str(),
            "total_cents": order.total_cents
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Created order {} (buyer {}, farmer {}, {} cents): {}",
        order.id.0,
        buyer,
        farmer,
        total_cents,
        order.order_status.label()
    );

    Ok(())
}

// =============================================================================
// TRANSITION COMMANDS
// =============================================================================

/// Print a transition outcome in either mode.
fn print_outcome(json_mode: bool, outcome: Option<&LifecycleEvent>) {
    match outcome {
        Some(event) => {
            if json_mode {
                let output = serde_json::json!({
                    "changed": true,
                    "seq": event.seq,
                    "entity": event.kind.as_str(),
                    "entity_id": event.entity_id,
                    "old_status": event.old_status,
                    "new_status": event.new_status
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output).unwrap_or_default()
                );
            } else {
                println!(
                    "{} {} moved {} -> {} (event #{})",
                    event.kind, event.entity_id, event.old_status, event.new_status, event.seq
                );
            }
        }
        None => {
            if json_mode {
                println!("{}", serde_json::json!({ "changed": false }));
            } else {
                println!("Already at the requested status; nothing to do");
            }
        }
    }
}

/// Move an order along its fulfilment pipeline.
pub fn cmd_transition(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    order: u64,
    target: &str,
    actor: u64,
    role: &str,
) -> Result<(), FarmgateError> {
    let actor = parse_actor(actor, role)?;
    let target = OrderStatus::parse(target)
        .ok_or_else(|| FarmgateError::InvalidInput(format!("unknown order status: {}", target)))?;

    let mut session = load_or_create_session(db_path, backend)?;
    let outcome = session.transition_order(OrderId(order), target, actor, now_ms())?;
    save_session(&session, db_path)?;

    print_outcome(json_mode, outcome.as_ref());
    Ok(())
}

/// Move an order's payment status.
pub fn cmd_pay(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    order: u64,
    target: &str,
    actor: u64,
    role: &str,
) -> Result<(), FarmgateError> {
    let actor = parse_actor(actor, role)?;
    let target = PaymentStatus::parse(target).ok_or_else(|| {
        FarmgateError::InvalidInput(format!("unknown payment status: {}", target))
    })?;

    let mut session = load_or_create_session(db_path, backend)?;
    let outcome = session.transition_payment(OrderId(order), target, actor, now_ms())?;
    save_session(&session, db_path)?;

    print_outcome(json_mode, outcome.as_ref());
    Ok(())
}

/// Approve or reject a product listing.
pub fn cmd_review_product(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    product: u64,
    decision: &str,
    actor: u64,
    role: &str,
) -> Result<(), FarmgateError> {
    let actor = parse_actor(actor, role)?;
    let approve = match decision {
        "approve" => true,
        "reject" => false,
        other => {
            return Err(FarmgateError::InvalidInput(format!(
                "unknown decision: {} (use approve or reject)",
                other
            )));
        }
    };

    let mut session = load_or_create_session(db_path, backend)?;
    let outcome = session.review_product(ProductId(product), approve, actor, now_ms())?;
    save_session(&session, db_path)?;

    print_outcome(json_mode, outcome.as_ref());
    Ok(())
}

/// Verify or reject a verification document.
pub fn cmd_review_document(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    document: u64,
    decision: &str,
    actor: u64,
    role: &str,
) -> Result<(), FarmgateError> {
    let actor = parse_actor(actor, role)?;
    let verify = match decision {
        "verify" => true,
        "reject" => false,
        other => {
            return Err(FarmgateError::InvalidInput(format!(
                "unknown decision: {} (use verify or reject)",
                other
            )));
        }
    };

    let mut session = load_or_create_session(db_path, backend)?;
    let outcome = session.review_document(DocumentId(document), verify, actor, now_ms())?;
    save_session(&session, db_path)?;

    print_outcome(json_mode, outcome.as_ref());
    Ok(())
}

// =============================================================================
// NOTIFY COMMAND
// =============================================================================

/// Push a notification to a recipient.
pub fn cmd_notify(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    recipient: u64,
    body: &str,
) -> Result<(), FarmgateError> {
    let mut session = load_or_create_session(db_path, backend)?;
    let notification = session.push_notification(ActorId(recipient), body, now_ms())?;
    save_session(&session, db_path)?;

    if json_mode {
        let output = serde_json::json!({
            "id": notification.id.0,
            "recipient_id": notification.recipient.0,
            "state": notification.state.as_str()
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Pushed notification {} to recipient {}",
        notification.id.0, recipient
    );
    Ok(())
}

// =============================================================================
// EVENTS COMMAND
// =============================================================================

/// Print the lifecycle event log.
pub fn cmd_events(
    db_path: &PathBuf,
    backend: &str,
    json_mode: bool,
    since: u64,
) -> Result<(), FarmgateError> {
    let session = load_or_create_session(db_path, backend)?;
    let events = session.events_since(since)?;

    if json_mode {
        let output: Vec<serde_json::Value> = events
            .iter()
            .map(|event| {
                serde_json::json!({
                    "seq": event.seq,
                    "entity": event.kind.as_str(),
                    "entity_id": event.entity_id,
                    "old_status": event.old_status,
                    "new_status": event.new_status,
                    "actor_id": event.actor.id.0,
                    "actor_role": event.actor.role.as_str(),
                    "timestamp_ms": event.timestamp_ms
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    if events.is_empty() {
        println!("No events after #{}", since);
        return Ok(());
    }

    println!("Lifecycle Events (after #{})", since);
    println!("============================");
    for event in &events {
        println!(
            "#{:<6} {:>12} {:<6} {} -> {} (by {} {})",
            event.seq,
            event.kind.as_str(),
            event.entity_id,
            event.old_status,
            event.new_status,
            event.actor.role,
            event.actor.id.0
        );
    }

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the store.
pub fn cmd_export(
    db_path: &PathBuf,
    backend: &str,
    output: &std::path::Path,
) -> Result<(), FarmgateError> {
    let validated_output = validate_output_path(output)?;

    let session = load_or_create_session(db_path, backend)?;
    let snapshot = session.export_snapshot()?;
    let data = export_canonical(&snapshot)?;

    let header = verify_canonical(&data)?;
    println!("Checksum: {}", header.checksum);

    std::fs::write(&validated_output, &data)
        .map_err(|e| FarmgateError::SerializationError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);

    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import the store, replacing any existing contents.
pub fn cmd_import(
    db_path: &PathBuf,
    backend: &str,
    input: &std::path::Path,
) -> Result<(), FarmgateError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| FarmgateError::SerializationError(format!("Read file: {}", e)))?;

    let snapshot = import_canonical(&data)?;

    let mut session = load_or_create_session(db_path, backend)?;
    session.import_snapshot(&snapshot)?;
    save_session(&session, db_path)?;

    let counts = session.metrics()?;
    println!(
        "Imported {} orders, {} products, {} documents, {} notifications, {} events",
        counts.orders, counts.products, counts.documents, counts.notifications, counts.events
    );

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(db_path: &PathBuf, backend: &str, force: bool) -> Result<(), FarmgateError> {
    if db_path.exists() && !force {
        return Err(FarmgateError::SerializationError(
            "Database already exists. Use --force to overwrite.".to_string(),
        ));
    }

    match backend {
        "redb" => {
            if db_path.exists() {
                std::fs::remove_file(db_path)
                    .map_err(|e| FarmgateError::IoError(format!("Remove database: {}", e)))?;
            }
            let _session = Session::with_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        _ => {
            let session = Session::new();
            save_session(&session, db_path)?;
            println!("Initialized new memory-backed database file at {:?}", db_path);
        }
    }

    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load or create a session from a database path with specified backend.
///
/// The "memory" backend round-trips through the canonical file format:
/// the file (if present) is imported on load and rewritten on save.
pub fn load_or_create_session(db_path: &PathBuf, backend: &str) -> Result<Session, FarmgateError> {
    match backend {
        "redb" => Session::with_redb(db_path),
        "memory" => {
            if db_path.exists() {
                validate_file_size(db_path, MAX_IMPORT_FILE_SIZE)?;
                let data = std::fs::read(db_path)
                    .map_err(|e| FarmgateError::SerializationError(format!("Read db: {}", e)))?;
                let snapshot = import_canonical(&data)?;
                let mut session = Session::new();
                session.import_snapshot(&snapshot)?;
                Ok(session)
            } else {
                Ok(Session::new())
            }
        }
        other => Err(FarmgateError::InvalidInput(format!(
            "unknown backend: {} (use memory or redb)",
            other
        ))),
    }
}

/// Save a session to a database path.
pub fn save_session(session: &Session, db_path: &PathBuf) -> Result<(), FarmgateError> {
    if session.is_persistent() {
        // Redb backend - already persisted, nothing to do
        Ok(())
    } else {
        // Memory backend - export to canonical format
        let snapshot = session.export_snapshot()?;
        let data = export_canonical(&snapshot)?;
        std::fs::write(db_path, &data)
            .map_err(|e| FarmgateError::SerializationError(format!("Write db: {}", e)))?;
        Ok(())
    }
}
