//! Per-beneficiary escrow vault.
//!
//! A vault validates every precondition before mutating anything, so a
//! failed call leaves it exactly as it was. Role checks (who may call
//! what) live in the engine's authorization policy; the vault enforces
//! the state machine itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use openescrow_ledger::FundLedger;
use openescrow_types::{
    AccountId, ContributorEntry, DeliveryRecord, EscrowError, Result, VaultId,
};

use crate::state::VaultState;

/// Escrow record for a single beneficiary: balance, contributors,
/// requirements, and delivery state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    id: VaultId,
    /// The identity funds are escrowed for.
    beneficiary: AccountId,
    /// The identity that created the vault (first depositor on the lazy
    /// path, or the factory caller).
    owner: AccountId,
    /// The only identity permitted to release or refund. Fixed at
    /// creation; no rotation path.
    authority: AccountId,
    ledger: FundLedger,
    requirements: Option<String>,
    contact: Option<String>,
    delivery: Option<DeliveryRecord>,
    delivered: bool,
}

impl Vault {
    /// Create an empty vault bound to its authority and owner.
    #[must_use]
    pub fn new(
        id: VaultId,
        beneficiary: AccountId,
        owner: AccountId,
        authority: AccountId,
        max_contributors: usize,
    ) -> Self {
        Self {
            id,
            beneficiary,
            owner,
            authority,
            ledger: FundLedger::new(max_contributors),
            requirements: None,
            contact: None,
            delivery: None,
            delivered: false,
        }
    }

    // -----------------------------------------------------------------
    // Mutations (preconditions first, then a single atomic change)
    // -----------------------------------------------------------------

    /// Credit a deposit from `contributor`.
    ///
    /// # Errors
    /// - [`EscrowError::InvalidAmount`] if `amount <= 0`
    /// - [`EscrowError::CapacityExceeded`] for a fourth distinct contributor
    pub fn deposit(&mut self, contributor: AccountId, amount: Decimal) -> Result<()> {
        self.ledger.credit(contributor, amount)
    }

    /// Declare (or re-declare) requirements and optional contact info.
    /// Overwrites any prior declaration.
    ///
    /// # Errors
    /// - [`EscrowError::InsufficientFunds`] if the balance is zero
    /// - [`EscrowError::InvalidState`] for empty requirements text
    pub fn declare_requirements(
        &mut self,
        requirements: impl Into<String>,
        contact: Option<String>,
    ) -> Result<()> {
        let requirements = requirements.into();
        if self.balance() <= Decimal::ZERO {
            return Err(EscrowError::InsufficientFunds {
                beneficiary: self.beneficiary,
            });
        }
        if requirements.trim().is_empty() {
            return Err(EscrowError::InvalidState {
                reason: "requirements text must not be empty".to_string(),
            });
        }

        self.requirements = Some(requirements);
        self.contact = contact;
        Ok(())
    }

    /// Record the beneficiary's delivery hash. No resubmission.
    ///
    /// # Errors
    /// - [`EscrowError::InsufficientFunds`] if the balance is zero
    /// - [`EscrowError::InvalidState`] if requirements are missing or a
    ///   delivery was already recorded
    pub fn submit_delivery(
        &mut self,
        content_hash: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.balance() <= Decimal::ZERO {
            return Err(EscrowError::InsufficientFunds {
                beneficiary: self.beneficiary,
            });
        }
        if self.requirements.is_none() {
            return Err(EscrowError::InvalidState {
                reason: "requirements must be declared before delivery".to_string(),
            });
        }
        if self.delivery.is_some() {
            return Err(EscrowError::InvalidState {
                reason: "delivery already submitted".to_string(),
            });
        }

        self.delivery = Some(DeliveryRecord::new(content_hash, now));
        self.delivered = true;
        Ok(())
    }

    /// Clear the vault for settlement in one atomic step: balance to zero,
    /// contributors emptied, requirements/contact/delivery dropped.
    /// Returns the pre-clear balance and the drained contributor entries.
    pub fn clear(&mut self) -> (Decimal, Vec<ContributorEntry>) {
        let total = self.ledger.total();
        let entries = self.ledger.clear();
        self.requirements = None;
        self.contact = None;
        self.delivery = None;
        self.delivered = false;
        (total, entries)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    #[must_use]
    pub fn id(&self) -> VaultId {
        self.id
    }

    #[must_use]
    pub fn beneficiary(&self) -> AccountId {
        self.beneficiary
    }

    #[must_use]
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    #[must_use]
    pub fn authority(&self) -> AccountId {
        self.authority
    }

    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.ledger.total()
    }

    #[must_use]
    pub fn contributors(&self) -> &[ContributorEntry] {
        self.ledger.entries()
    }

    #[must_use]
    pub fn contributor_count(&self) -> usize {
        self.ledger.contributor_count()
    }

    #[must_use]
    pub fn is_contributor(&self, account: &AccountId) -> bool {
        self.ledger.is_contributor(account)
    }

    #[must_use]
    pub fn requirements(&self) -> Option<&str> {
        self.requirements.as_deref()
    }

    #[must_use]
    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }

    #[must_use]
    pub fn delivery(&self) -> Option<&DeliveryRecord> {
        self.delivery.as_ref()
    }

    #[must_use]
    pub fn delivered(&self) -> bool {
        self.delivered
    }

    /// Derived lifecycle state.
    #[must_use]
    pub fn state(&self) -> VaultState {
        if self.balance().is_zero() {
            VaultState::Empty
        } else if self.delivered {
            VaultState::Delivered
        } else if self.requirements.is_some() {
            VaultState::RequirementsSet
        } else {
            VaultState::Funded
        }
    }

    /// Verify the vault's internal invariants: ledger conservation (I1),
    /// and delivered implying both delivery and requirements present (I3).
    ///
    /// # Errors
    /// Returns [`EscrowError::ConservationViolation`] or
    /// [`EscrowError::InvalidState`] when an invariant is broken.
    pub fn check_invariants(&self) -> Result<()> {
        self.ledger.check_conservation()?;
        if self.delivered && (self.delivery.is_none() || self.requirements.is_none()) {
            return Err(EscrowError::InvalidState {
                reason: "delivered flag set without delivery and requirements".to_string(),
            });
        }
        Ok(())
    }
}
