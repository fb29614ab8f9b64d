//! # Innate Primitives
//!
//! Hardcoded runtime constants for the Farmgate policy engine.
//!
//! Farmgate starts with zero data but fixed rules. These limits are
//! compiled into the binary and are immutable at runtime. They bound
//! every externally supplied string and every import, so the policy
//! engine never allocates unboundedly on behalf of a caller.

/// Magic bytes for the Farmgate snapshot format header.
pub const MAGIC_BYTES: &[u8; 4] = b"FGTE";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for product names.
///
/// Names longer than this are rejected before any store mutation.
pub const MAX_NAME_LENGTH: usize = 256;

/// Maximum length for document labels.
pub const MAX_LABEL_LENGTH: usize = 256;

/// Maximum length for notification bodies (4 KB).
///
/// This prevents memory exhaustion from malicious or malformed input.
pub const MAX_BODY_LENGTH: usize = 4096;

/// Maximum monetary amount in cents (10^12 cents = 10 billion units).
///
/// Amounts above this are treated as input errors rather than silently
/// accepted; money is integer cents throughout, never floating point.
pub const MAX_AMOUNT_CENTS: u64 = 1_000_000_000_000;

/// Maximum number of records returned by a single list operation.
///
/// All list queries are computationally bounded.
pub const MAX_LIST_PAGE: usize = 1000;

// =============================================================================
// IMPORT LIMITS
// =============================================================================

/// Maximum allowed record count per entity table in snapshot imports.
///
/// This prevents memory exhaustion from malicious or corrupted data.
pub const MAX_IMPORT_ENTITY_COUNT: u64 = 1_000_000;

/// Maximum allowed event count in snapshot imports.
pub const MAX_IMPORT_EVENT_COUNT: u64 = 10_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"FGTE");
    }

    #[test]
    fn list_page_is_bounded() {
        assert!((MAX_LIST_PAGE as u64) <= MAX_IMPORT_ENTITY_COUNT);
    }
}
