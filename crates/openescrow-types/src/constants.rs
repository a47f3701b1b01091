//! System-wide constants for the OpenEscrow settlement engine.

/// Maximum number of distinct contributors per vault.
pub const MAX_CONTRIBUTORS: usize = 3;

/// Confidence score below which a PASS verdict is demoted to
/// PENDING_REVIEW (human-in-the-loop gate).
pub const CONFIDENCE_REVIEW_THRESHOLD: u8 = 80;

/// Domain tag mixed into event payload hashes.
pub const EVENT_DOMAIN_TAG: &[u8] = b"openescrow:event:v1:";
