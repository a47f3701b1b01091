//! Contribution tracking types for the OpenEscrow fund model.
//!
//! Every vault tracks its contributors individually so a refund can return
//! exactly what each identity put in. Entries are unique per contributor;
//! repeat deposits accumulate in place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A single contributor's recorded stake in a vault.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContributorEntry {
    /// The identity that deposited the value.
    pub contributor: AccountId,
    /// Accumulated amount from this contributor. Always positive while
    /// the entry is retained.
    pub amount: Decimal,
}

impl ContributorEntry {
    #[must_use]
    pub fn new(contributor: AccountId, amount: Decimal) -> Self {
        Self {
            contributor,
            amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serde_roundtrip() {
        let entry = ContributorEntry::new(AccountId([7u8; 32]), Decimal::new(12345, 2));
        let json = serde_json::to_string(&entry).unwrap();
        let back: ContributorEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
