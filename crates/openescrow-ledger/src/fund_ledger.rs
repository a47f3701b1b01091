//! Per-vault fund ledger with multi-contributor accounting.
//!
//! Tracks the accumulated balance and the ordered list of contributor
//! entries for one vault. All mutations are atomic: either the full
//! operation succeeds or the ledger is unchanged.
//!
//! Invariants:
//! - `total == Σ entries[*].amount` at all times
//! - at most `max_contributors` distinct contributors, each appearing once
//! - every retained entry has `amount > 0`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use openescrow_types::{AccountId, ContributorEntry, EscrowError, Result};

/// Accumulated balance plus per-contributor entries for a single vault.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FundLedger {
    /// Contributor entries in insertion order.
    entries: Vec<ContributorEntry>,
    /// Sum of all entry amounts.
    total: Decimal,
    /// Maximum distinct contributors before `credit` fails.
    max_contributors: usize,
}

impl FundLedger {
    /// Create an empty ledger with the given contributor capacity.
    #[must_use]
    pub fn new(max_contributors: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_contributors),
            total: Decimal::ZERO,
            max_contributors,
        }
    }

    /// Credit `amount` from `contributor`.
    ///
    /// An existing contributor accumulates in place; a new contributor is
    /// appended while under capacity.
    ///
    /// # Errors
    /// - [`EscrowError::InvalidAmount`] if `amount <= 0`
    /// - [`EscrowError::CapacityExceeded`] for a new contributor beyond
    ///   capacity
    pub fn credit(&mut self, contributor: AccountId, amount: Decimal) -> Result<()> {
        if amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount { amount });
        }

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.contributor == contributor)
        {
            entry.amount += amount;
        } else {
            if self.entries.len() >= self.max_contributors {
                return Err(EscrowError::CapacityExceeded {
                    max: self.max_contributors,
                });
            }
            self.entries.push(ContributorEntry::new(contributor, amount));
        }

        self.total += amount;
        Ok(())
    }

    /// Zero the balance and empty the contributor list in one step,
    /// returning the cleared entries (for refund disbursement).
    pub fn clear(&mut self) -> Vec<ContributorEntry> {
        self.total = Decimal::ZERO;
        std::mem::take(&mut self.entries)
    }

    /// Accumulated balance.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Contributor entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[ContributorEntry] {
        &self.entries
    }

    /// Number of distinct contributors.
    #[must_use]
    pub fn contributor_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether `account` has a retained entry.
    #[must_use]
    pub fn is_contributor(&self, account: &AccountId) -> bool {
        self.entries.iter().any(|e| &e.contributor == account)
    }

    /// The recorded amount for `account`, zero if absent.
    #[must_use]
    pub fn amount_of(&self, account: &AccountId) -> Decimal {
        self.entries
            .iter()
            .find(|e| &e.contributor == account)
            .map_or(Decimal::ZERO, |e| e.amount)
    }

    /// Whether the ledger holds no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total.is_zero() && self.entries.is_empty()
    }

    /// Verify `total == Σ entries[*].amount`.
    ///
    /// # Errors
    /// Returns [`EscrowError::ConservationViolation`] on mismatch.
    pub fn check_conservation(&self) -> Result<()> {
        let sum: Decimal = self.entries.iter().map(|e| e.amount).sum();
        if sum != self.total {
            return Err(EscrowError::ConservationViolation {
                reason: format!("ledger total {} != entry sum {sum}", self.total),
            });
        }
        Ok(())
    }
}
