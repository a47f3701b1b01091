//! Delivery record types.
//!
//! A beneficiary submits a content hash as proof of delivery; the engine
//! records the hash and a timestamp. The content itself never enters the
//! engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Recorded delivery for a vault: content hash plus submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryRecord {
    /// Opaque content hash supplied by the beneficiary (typically hex).
    pub content_hash: String,
    /// When the delivery was submitted.
    pub submitted_at: DateTime<Utc>,
}

impl DeliveryRecord {
    #[must_use]
    pub fn new(content_hash: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            content_hash: content_hash.into(),
            submitted_at,
        }
    }
}

/// SHA-256 of delivered content, hex-encoded. Convenience for callers that
/// hold the raw content and want the canonical hash to submit.
#[must_use]
pub fn content_hash_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable() {
        let a = content_hash_hex(b"deliverable v1");
        let b = content_hash_hex(b"deliverable v1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let c = content_hash_hex(b"deliverable v2");
        assert_ne!(a, c);
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = DeliveryRecord::new("0xabc", Utc::now());
        let json = serde_json::to_string(&rec).unwrap();
        let back: DeliveryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
