//! Money conservation invariant checker.
//!
//! Invariant enforced after every settlement:
//! ```text
//! Σ(vault balances) == Σ(deposits) − Σ(payouts)
//! ```
//!
//! If this invariant ever breaks, something has gone catastrophically
//! wrong — the engine surfaces it as a critical error instead of
//! continuing.

use rust_decimal::Decimal;

use openescrow_types::{EscrowError, Result};

/// Tracks escrow-wide deposit and payout totals since genesis.
#[derive(Debug, Default)]
pub struct ConservationLedger {
    /// Total value deposited into vaults since genesis.
    deposits: Decimal,
    /// Total value paid out by release and refund since genesis.
    payouts: Decimal,
}

impl ConservationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            deposits: Decimal::ZERO,
            payouts: Decimal::ZERO,
        }
    }

    /// Record an accepted deposit.
    pub fn record_deposit(&mut self, amount: Decimal) {
        self.deposits += amount;
    }

    /// Record a completed payout (release or refund).
    pub fn record_payout(&mut self, amount: Decimal) {
        self.payouts += amount;
    }

    /// Expected total value currently held in escrow.
    #[must_use]
    pub fn expected_escrowed(&self) -> Decimal {
        self.deposits - self.payouts
    }

    /// Verify that the actual escrowed total (sum of all vault balances)
    /// matches deposits − payouts.
    ///
    /// # Errors
    /// Returns [`EscrowError::ConservationViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_escrowed: Decimal) -> Result<()> {
        let expected = self.expected_escrowed();
        if actual_escrowed != expected {
            return Err(EscrowError::ConservationViolation {
                reason: format!(
                    "actual escrowed {actual_escrowed} != expected {expected} \
                     (deposits={}, payouts={})",
                    self.deposits, self.payouts,
                ),
            });
        }
        Ok(())
    }

    /// Total deposits since genesis.
    #[must_use]
    pub fn total_deposits(&self) -> Decimal {
        self.deposits
    }

    /// Total payouts since genesis.
    #[must_use]
    pub fn total_payouts(&self) -> Decimal {
        self.payouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ledger_expects_zero() {
        let cl = ConservationLedger::new();
        assert_eq!(cl.expected_escrowed(), Decimal::ZERO);
        assert!(cl.verify(Decimal::ZERO).is_ok());
    }

    #[test]
    fn deposits_increase_expected() {
        let mut cl = ConservationLedger::new();
        cl.record_deposit(Decimal::new(1000, 0));
        cl.record_deposit(Decimal::new(500, 0));
        assert_eq!(cl.expected_escrowed(), Decimal::new(1500, 0));
    }

    #[test]
    fn payouts_decrease_expected() {
        let mut cl = ConservationLedger::new();
        cl.record_deposit(Decimal::new(1000, 0));
        cl.record_payout(Decimal::new(300, 0));
        assert_eq!(cl.expected_escrowed(), Decimal::new(700, 0));
    }

    #[test]
    fn verify_passes_when_balanced() {
        let mut cl = ConservationLedger::new();
        cl.record_deposit(Decimal::new(10, 0));
        cl.record_payout(Decimal::new(3, 0));
        assert!(cl.verify(Decimal::new(7, 0)).is_ok());
    }

    #[test]
    fn verify_fails_when_imbalanced() {
        let mut cl = ConservationLedger::new();
        cl.record_deposit(Decimal::new(10, 0));
        let err = cl.verify(Decimal::new(11, 0)).unwrap_err();
        assert!(matches!(err, EscrowError::ConservationViolation { .. }));
    }

    #[test]
    fn full_cycle_nets_to_zero() {
        // Deposit then release everything: nothing should remain escrowed.
        let mut cl = ConservationLedger::new();
        cl.record_deposit(Decimal::new(15, 1));
        cl.record_payout(Decimal::new(15, 1));
        assert!(cl.verify(Decimal::ZERO).is_ok());
    }
}
