//! Event types for the OpenEscrow audit trail.
//!
//! Every successful mutation (vault created, deposit, requirements set,
//! delivery submitted, release, refund) produces an [`EventRecord`] in the
//! engine's append-only log. Records carry a SHA-256 hash of the serialized
//! payload so downstream consumers can verify integrity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AccountId, SettlementId, VaultId};

/// A notification emitted by the settlement engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum EscrowEvent {
    /// A vault was created (explicitly via the factory or lazily on first
    /// deposit).
    VaultCreated {
        vault_id: VaultId,
        beneficiary: AccountId,
        creator: AccountId,
    },
    /// A contributor deposited value for a beneficiary.
    Deposit {
        beneficiary: AccountId,
        contributor: AccountId,
        amount: Decimal,
    },
    /// A contributor declared requirements (and optional contact) for the
    /// current cycle.
    RequirementsSet {
        beneficiary: AccountId,
        requirements: String,
        contact: Option<String>,
    },
    /// The beneficiary submitted a delivery hash.
    DeliverySubmitted {
        beneficiary: AccountId,
        delivery_hash: String,
        timestamp: DateTime<Utc>,
    },
    /// The full vault balance was released to the beneficiary.
    Released {
        beneficiary: AccountId,
        amount: Decimal,
        settlement_id: SettlementId,
    },
    /// One contributor was refunded its exact recorded amount. Emitted once
    /// per contributor.
    Refunded {
        beneficiary: AccountId,
        contributor: AccountId,
        amount: Decimal,
        reason: String,
    },
}

impl EscrowEvent {
    /// Stable event kind tag, used in logs and external feeds.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::VaultCreated { .. } => "VAULT_CREATED",
            Self::Deposit { .. } => "DEPOSIT",
            Self::RequirementsSet { .. } => "REQUIREMENTS_SET",
            Self::DeliverySubmitted { .. } => "DELIVERY_SUBMITTED",
            Self::Released { .. } => "RELEASED",
            Self::Refunded { .. } => "REFUNDED",
        }
    }
}

impl std::fmt::Display for EscrowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// An entry in the append-only event log.
///
/// Each record includes a monotonic sequence number and a SHA-256 hash of
/// the JSON-serialized event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log (monotonic, starts at 1).
    pub sequence: u64,
    /// The event payload.
    pub event: EscrowEvent,
    /// SHA-256 over the domain tag and the serialized payload.
    pub payload_hash: [u8; 32],
    /// When the record was appended.
    pub recorded_at: DateTime<Utc>,
}

impl EventRecord {
    /// Append-time constructor: hashes the payload and stamps the record.
    #[must_use]
    pub fn new(sequence: u64, event: EscrowEvent) -> Self {
        let payload_hash = hash_event(&event);
        Self {
            sequence,
            event,
            payload_hash,
            recorded_at: Utc::now(),
        }
    }

    /// Recompute the payload hash and compare with the stored one.
    #[must_use]
    pub fn verify_hash(&self) -> bool {
        hash_event(&self.event) == self.payload_hash
    }
}

fn hash_event(event: &EscrowEvent) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(crate::constants::EVENT_DOMAIN_TAG);
    // Serialization of our own enum cannot fail.
    let payload = serde_json::to_vec(event).unwrap_or_default();
    hasher.update(&payload);
    hasher.finalize().into()
}
