//! # Canonical Snapshot Module
//!
//! > **The "Redb Compromise":**
//! > - Runtime: the store uses `redb` for ACID transactions.
//! > - Verification: `redb` files are NOT guaranteed bit-identical across runs.
//! > - Mandate: `export_canonical()` serializes to a bit-exact `postcard`
//! >   stream sorted by id. **This export is the source of truth for
//! >   backup and verification.**

use crate::entity::{Notification, Order, Product, VerificationDocument};
use crate::event::LifecycleEvent;
use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_IMPORT_ENTITY_COUNT, MAX_IMPORT_EVENT_COUNT};
use crate::types::FarmgateError;
use serde::{Deserialize, Serialize};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// A full copy of every table, sorted by id for deterministic bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub orders: Vec<Order>,
    pub products: Vec<Product>,
    pub documents: Vec<VerificationDocument>,
    pub notifications: Vec<Notification>,
    pub events: Vec<LifecycleEvent>,
}

impl MarketSnapshot {
    /// Sort every table by id so serialization is bit-exact regardless
    /// of how the snapshot was assembled.
    pub fn normalize(&mut self) {
        self.orders.sort_by_key(|o| o.id);
        self.products.sort_by_key(|p| p.id);
        self.documents.sort_by_key(|d| d.id);
        self.notifications.sort_by_key(|n| n.id);
        self.events.sort_by_key(|e| e.seq);
    }
}

// =============================================================================
// CANONICAL HEADER
// =============================================================================

/// Header for canonical snapshot files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalHeader {
    /// Magic bytes to identify the format.
    pub magic: [u8; 4],
    /// Format version for compatibility.
    pub version: u8,
    /// Record counts per table.
    pub order_count: u64,
    pub product_count: u64,
    pub document_count: u64,
    pub notification_count: u64,
    pub event_count: u64,
    /// Checksum of the body bytes (rotate-xor, deterministic).
    pub checksum: u64,
}

impl CanonicalHeader {
    /// Create a header for a snapshot with the given body checksum.
    #[must_use]
    pub fn for_snapshot(snapshot: &MarketSnapshot, checksum: u64) -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
            order_count: snapshot.orders.len() as u64,
            product_count: snapshot.products.len() as u64,
            document_count: snapshot.documents.len() as u64,
            notification_count: snapshot.notifications.len() as u64,
            event_count: snapshot.events.len() as u64,
            checksum,
        }
    }

    /// Validate the header.
    ///
    /// # Security Note
    ///
    /// Error messages are intentionally generic to avoid leaking format
    /// details, and all counts are bounds-checked before any allocation.
    pub fn validate(&self) -> Result<(), FarmgateError> {
        if self.magic != *MAGIC_BYTES {
            return Err(FarmgateError::DeserializationError(
                "invalid file format".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(FarmgateError::DeserializationError(
                "unsupported file version".to_string(),
            ));
        }
        let entity_counts = [
            self.order_count,
            self.product_count,
            self.document_count,
            self.notification_count,
        ];
        if entity_counts.iter().any(|&c| c > MAX_IMPORT_ENTITY_COUNT) {
            return Err(FarmgateError::DeserializationError(
                "entity count exceeds import limit".to_string(),
            ));
        }
        if self.event_count > MAX_IMPORT_EVENT_COUNT {
            return Err(FarmgateError::DeserializationError(
                "event count exceeds import limit".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// CHECKSUM
// =============================================================================

/// Deterministic rotate-xor checksum over the body bytes.
///
/// Not cryptographic; detects corruption and truncation, which is all
/// backup verification needs here.
#[must_use]
pub fn canonical_checksum(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, b| acc.rotate_left(7) ^ u64::from(*b))
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Serialize a snapshot to the canonical byte format.
///
/// The snapshot is normalized (sorted by id) first, so equal stores
/// always produce identical bytes.
pub fn export_canonical(snapshot: &MarketSnapshot) -> Result<Vec<u8>, FarmgateError> {
    let mut sorted = snapshot.clone();
    sorted.normalize();

    let body = postcard::to_allocvec(&sorted)
        .map_err(|e| FarmgateError::SerializationError(e.to_string()))?;
    let header = CanonicalHeader::for_snapshot(&sorted, canonical_checksum(&body));

    let mut out = postcard::to_allocvec(&header)
        .map_err(|e| FarmgateError::SerializationError(e.to_string()))?;
    out.extend_from_slice(&body);
    Ok(out)
}

/// Parse and validate the header of a canonical byte stream, checking
/// the body checksum without deserializing the body.
pub fn verify_canonical(bytes: &[u8]) -> Result<CanonicalHeader, FarmgateError> {
    let (header, body): (CanonicalHeader, &[u8]) = postcard::take_from_bytes(bytes)
        .map_err(|e| FarmgateError::DeserializationError(e.to_string()))?;
    header.validate()?;
    if canonical_checksum(body) != header.checksum {
        return Err(FarmgateError::DeserializationError(
            "checksum mismatch".to_string(),
        ));
    }
    Ok(header)
}

/// Deserialize a canonical byte stream back into a snapshot.
pub fn import_canonical(bytes: &[u8]) -> Result<MarketSnapshot, FarmgateError> {
    let (header, body): (CanonicalHeader, &[u8]) = postcard::take_from_bytes(bytes)
        .map_err(|e| FarmgateError::DeserializationError(e.to_string()))?;
    header.validate()?;
    if canonical_checksum(body) != header.checksum {
        return Err(FarmgateError::DeserializationError(
            "checksum mismatch".to_string(),
        ));
    }

    let snapshot: MarketSnapshot = postcard::from_bytes(body)
        .map_err(|e| FarmgateError::DeserializationError(e.to_string()))?;

    // Counts in the header must agree with the body.
    if snapshot.orders.len() as u64 != header.order_count
        || snapshot.products.len() as u64 != header.product_count
        || snapshot.documents.len() as u64 != header.document_count
        || snapshot.notifications.len() as u64 != header.notification_count
        || snapshot.events.len() as u64 != header.event_count
    {
        return Err(FarmgateError::DeserializationError(
            "header counts disagree with body".to_string(),
        ));
    }
    Ok(snapshot)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Order;
    use crate::types::{ActorId, OrderId};

    fn sample_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            orders: vec![
                Order::new(OrderId(2), ActorId(1), ActorId(2), 500, 10),
                Order::new(OrderId(1), ActorId(1), ActorId(2), 300, 5),
            ],
            ..MarketSnapshot::default()
        }
    }

    #[test]
    fn export_import_round_trip() {
        let snapshot = sample_snapshot();
        let bytes = export_canonical(&snapshot).expect("export");
        let imported = import_canonical(&bytes).expect("import");
        assert_eq!(imported.orders.len(), 2);
        // normalized: sorted by id regardless of input order
        assert_eq!(imported.orders[0].id, OrderId(1));
    }

    #[test]
    fn export_is_deterministic_under_reordering() {
        let a = sample_snapshot();
        let mut b = sample_snapshot();
        b.orders.reverse();
        assert_eq!(
            export_canonical(&a).expect("export"),
            export_canonical(&b).expect("export")
        );
    }

    #[test]
    fn corrupted_body_fails_checksum() {
        let bytes = {
            let mut bytes = export_canonical(&sample_snapshot()).expect("export");
            let last = bytes.len() - 1;
            bytes[last] ^= 0xFF;
            bytes
        };
        let err = import_canonical(&bytes).expect_err("must fail");
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut bytes = export_canonical(&sample_snapshot()).expect("export");
        bytes[0] = b'X';
        assert!(verify_canonical(&bytes).is_err());
    }

    #[test]
    fn verify_reports_counts_without_deserializing_body() {
        let bytes = export_canonical(&sample_snapshot()).expect("export");
        let header = verify_canonical(&bytes).expect("verify");
        assert_eq!(header.order_count, 2);
        assert_eq!(header.event_count, 0);
    }
}
