//! Vault lifecycle states.
//!
//! The state is derived from vault data rather than stored: a settled vault
//! is cleared back to `Empty` and can start a new cycle for the same
//! beneficiary.

use serde::{Deserialize, Serialize};

/// Derived lifecycle state of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultState {
    /// No balance; fresh or cleared by a settlement.
    Empty,
    /// At least one deposit accepted.
    Funded,
    /// A contributor has declared requirements.
    RequirementsSet,
    /// The beneficiary has submitted a delivery hash.
    Delivered,
}

impl VaultState {
    /// Whether the authority may settle (release or refund). The only hard
    /// gate is a positive balance; the workflow states merely describe the
    /// intended path.
    #[must_use]
    pub fn can_settle(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}

impl std::fmt::Display for VaultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "EMPTY"),
            Self::Funded => write!(f, "FUNDED"),
            Self::RequirementsSet => write!(f, "REQUIREMENTS_SET"),
            Self::Delivered => write!(f, "DELIVERED"),
        }
    }
}
