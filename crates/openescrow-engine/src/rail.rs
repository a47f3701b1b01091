//! The value transfer seam between the engine and external accounts.
//!
//! The engine mutates its internal state first, then settles the external
//! leg through a [`TransferRail`]. [`TransferRail::disburse`] is
//! all-or-nothing by contract: an implementation must either complete every
//! payment in the batch or apply none of them and return an error, so the
//! engine can roll back its internal state without partial payouts in the
//! world.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::debug;

use openescrow_types::{AccountId, EscrowError, Result};

/// One payout leg: `amount` to `recipient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    pub recipient: AccountId,
    pub amount: Decimal,
}

/// Moves value between the escrow pool and external accounts.
pub trait TransferRail {
    /// Pull `amount` from `from` into the escrow pool.
    ///
    /// # Errors
    /// Returns [`EscrowError::TransferFailed`] if the pull does not
    /// complete; the rail must leave `from` untouched in that case.
    fn collect(&mut self, from: AccountId, amount: Decimal) -> Result<()>;

    /// Push a batch of payouts out of the escrow pool. All-or-nothing:
    /// either every payment lands or none do.
    ///
    /// # Errors
    /// Returns [`EscrowError::TransferFailed`] naming the first refusing
    /// recipient; no payment in the batch has been applied.
    fn disburse(&mut self, payments: &[Payment]) -> Result<()>;
}

/// In-memory account book backing the default rail.
///
/// Collections require a sufficient external balance; disbursements only
/// ever credit, so a validated batch cannot fail mid-way.
#[derive(Debug, Default)]
pub struct AccountBook {
    accounts: HashMap<AccountId, Decimal>,
}

impl AccountBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Top up an external account (funding side, outside escrow).
    pub fn fund(&mut self, account: AccountId, amount: Decimal) {
        *self.accounts.entry(account).or_insert(Decimal::ZERO) += amount;
    }

    /// External balance of `account`. Unknown accounts hold zero.
    #[must_use]
    pub fn balance(&self, account: &AccountId) -> Decimal {
        self.accounts.get(account).copied().unwrap_or(Decimal::ZERO)
    }
}

impl TransferRail for AccountBook {
    fn collect(&mut self, from: AccountId, amount: Decimal) -> Result<()> {
        let balance = self.balance(&from);
        if balance < amount {
            return Err(EscrowError::TransferFailed {
                counterparty: from,
                reason: format!("external balance {balance} below {amount}"),
            });
        }
        *self.accounts.entry(from).or_insert(Decimal::ZERO) -= amount;
        debug!(from = %from, %amount, "collected");
        Ok(())
    }

    fn disburse(&mut self, payments: &[Payment]) -> Result<()> {
        for payment in payments {
            *self
                .accounts
                .entry(payment.recipient)
                .or_insert(Decimal::ZERO) += payment.amount;
            debug!(to = %payment.recipient, amount = %payment.amount, "disbursed");
        }
        Ok(())
    }
}

/// Rail decorator that refuses disbursements to configured recipients.
/// Exercises the engine's transfer-failure rollback path in tests.
#[derive(Debug, Default)]
pub struct RejectingRail {
    book: AccountBook,
    refusing: HashSet<AccountId>,
}

impl RejectingRail {
    #[must_use]
    pub fn new() -> Self {
        Self {
            book: AccountBook::new(),
            refusing: HashSet::new(),
        }
    }

    /// Make `account` refuse all incoming payments.
    pub fn refuse(&mut self, account: AccountId) {
        self.refusing.insert(account);
    }

    /// Let `account` accept payments again.
    pub fn accept(&mut self, account: AccountId) {
        self.refusing.remove(&account);
    }

    /// The wrapped account book.
    #[must_use]
    pub fn book(&self) -> &AccountBook {
        &self.book
    }

    /// Mutable access to the wrapped account book.
    pub fn book_mut(&mut self) -> &mut AccountBook {
        &mut self.book
    }
}

impl TransferRail for RejectingRail {
    fn collect(&mut self, from: AccountId, amount: Decimal) -> Result<()> {
        self.book.collect(from, amount)
    }

    fn disburse(&mut self, payments: &[Payment]) -> Result<()> {
        // Validate the whole batch before applying anything.
        for payment in payments {
            if self.refusing.contains(&payment.recipient) {
                return Err(EscrowError::TransferFailed {
                    counterparty: payment.recipient,
                    reason: "recipient refused the payment".to_string(),
                });
            }
        }
        self.book.disburse(payments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_requires_external_balance() {
        let mut book = AccountBook::new();
        let buyer = AccountId::random();
        book.fund(buyer, Decimal::ONE);

        let err = book.collect(buyer, Decimal::TWO).unwrap_err();
        assert!(matches!(err, EscrowError::TransferFailed { .. }));
        // Failed collection leaves the balance untouched.
        assert_eq!(book.balance(&buyer), Decimal::ONE);

        book.collect(buyer, Decimal::ONE).unwrap();
        assert_eq!(book.balance(&buyer), Decimal::ZERO);
    }

    #[test]
    fn disburse_credits_every_recipient() {
        let mut book = AccountBook::new();
        let a = AccountId::random();
        let b = AccountId::random();
        book.disburse(&[
            Payment {
                recipient: a,
                amount: Decimal::ONE,
            },
            Payment {
                recipient: b,
                amount: Decimal::TWO,
            },
        ])
        .unwrap();
        assert_eq!(book.balance(&a), Decimal::ONE);
        assert_eq!(book.balance(&b), Decimal::TWO);
    }

    #[test]
    fn rejecting_rail_is_all_or_nothing() {
        let mut rail = RejectingRail::new();
        let good = AccountId::random();
        let bad = AccountId::random();
        rail.refuse(bad);

        let batch = [
            Payment {
                recipient: good,
                amount: Decimal::ONE,
            },
            Payment {
                recipient: bad,
                amount: Decimal::ONE,
            },
        ];
        let err = rail.disburse(&batch).unwrap_err();
        assert!(matches!(err, EscrowError::TransferFailed { counterparty, .. } if counterparty == bad));
        // Neither leg was applied.
        assert_eq!(rail.book().balance(&good), Decimal::ZERO);
        assert_eq!(rail.book().balance(&bad), Decimal::ZERO);

        rail.accept(bad);
        rail.disburse(&batch).unwrap();
        assert_eq!(rail.book().balance(&good), Decimal::ONE);
        assert_eq!(rail.book().balance(&bad), Decimal::ONE);
    }
}
