//! Error types for the OpenEscrow settlement engine.
//!
//! All errors use the `ESC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Participant / authorization errors
//! - 2xx: Fund errors
//! - 3xx: Vault state errors
//! - 4xx: Settlement errors
//! - 5xx: Transfer / conservation errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, SettlementId, VaultId};

/// Central error enum for all OpenEscrow operations.
#[derive(Debug, Error)]
pub enum EscrowError {
    // =================================================================
    // Participant / Authorization Errors (1xx)
    // =================================================================
    /// The caller is not permitted to invoke this operation.
    #[error("ESC_ERR_100: Unauthorized: caller {caller} may not invoke {operation}")]
    Unauthorized {
        operation: String,
        caller: AccountId,
    },

    /// The participant identity is structurally invalid (null identity or
    /// self-dealing).
    #[error("ESC_ERR_101: Invalid participant: {reason}")]
    InvalidParticipant { reason: String },

    // =================================================================
    // Fund Errors (2xx)
    // =================================================================
    /// A deposit or transfer amount was zero or negative.
    #[error("ESC_ERR_200: Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// A fourth distinct contributor tried to join a full vault.
    #[error("ESC_ERR_201: Contributor capacity exceeded (max {max})")]
    CapacityExceeded { max: usize },

    /// The vault balance is zero; nothing to release or refund.
    #[error("ESC_ERR_202: Insufficient funds for beneficiary {beneficiary}")]
    InsufficientFunds { beneficiary: AccountId },

    // =================================================================
    // Vault State Errors (3xx)
    // =================================================================
    /// The operation is not valid in the vault's current state.
    #[error("ESC_ERR_300: Invalid vault state: {reason}")]
    InvalidState { reason: String },

    /// No vault exists for the given beneficiary.
    #[error("ESC_ERR_301: No vault for beneficiary {0}")]
    VaultNotFound(AccountId),

    /// A vault already exists for this beneficiary (one vault per identity).
    #[error("ESC_ERR_302: Vault already exists for beneficiary {0}")]
    VaultExists(AccountId),

    // =================================================================
    // Settlement Errors (4xx)
    // =================================================================
    /// The settlement identifier was already finalized (replay protection).
    #[error("ESC_ERR_400: Duplicate settlement id: {0}")]
    DuplicateSettlementId(SettlementId),

    /// The settlement identifier is structurally invalid.
    #[error("ESC_ERR_401: Invalid settlement id: {reason}")]
    InvalidSettlementId { reason: String },

    /// Another operation on the same vault is already in progress
    /// (reentrancy exclusion).
    #[error("ESC_ERR_402: Operation already in progress on {0}")]
    OperationInProgress(VaultId),

    // =================================================================
    // Transfer / Conservation Errors (5xx)
    // =================================================================
    /// Value movement to or from a counterparty did not complete. The
    /// triggering operation has been rolled back in full.
    #[error("ESC_ERR_500: Transfer failed for {counterparty}: {reason}")]
    TransferFailed {
        counterparty: AccountId,
        reason: String,
    },

    /// Money conservation invariant violated — critical safety alert.
    #[error("ESC_ERR_501: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("ESC_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid config, bad limits, etc.).
    #[error("ESC_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;
