//! # openescrow-ledger
//!
//! Leaf accounting components of the OpenEscrow engine:
//!
//! - [`FundLedger`] — per-vault multi-contributor balance with the money
//!   conservation invariant (`total == Σ contributor amounts`).
//! - [`ReplayRegistry`] — global monotonic set of finalized settlement
//!   identifiers; atomic check-and-set prevents double release.
//! - [`ConservationLedger`] — tracks deposits and payouts since genesis so
//!   the engine can verify `Σ vault balances == deposits − payouts` after
//!   every settlement.

pub mod conservation;
pub mod fund_ledger;
pub mod replay;

pub use conservation::ConservationLedger;
pub use fund_ledger::FundLedger;
pub use replay::ReplayRegistry;
