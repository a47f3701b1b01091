//! # openescrow-vault
//!
//! Per-beneficiary escrow vaults and their factory.
//!
//! A [`Vault`] composes a fund ledger, the beneficiary-declared
//! requirements/contact metadata, and the delivery record, and owns the
//! settlement state machine:
//!
//! ```text
//! Empty → Funded → RequirementsSet → Delivered → (settled, cleared) → Empty
//! ```
//!
//! The [`VaultFactory`] creates vaults, fixing the oracle authority and the
//! owner identity at creation time, and maintains the global and
//! per-creator registries.

pub mod factory;
pub mod state;
pub mod vault;

pub use factory::VaultFactory;
pub use state::VaultState;
pub use vault::Vault;
