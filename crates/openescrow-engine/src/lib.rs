//! # openescrow-engine
//!
//! The settlement engine façade. Wraps vaults, the replay registry, and the
//! conservation ledger behind one mutation surface:
//!
//! 1. Per-vault reentrancy exclusion at operation entry
//! 2. Authorization via an explicit operation → role policy table
//! 3. Precondition validation before any state change
//! 4. Internal state mutated to its post-condition *before* the external
//!    value transfer
//! 5. Full rollback to pre-call state if the transfer fails
//!
//! Refunds are **all-or-nothing**: one failed recipient transfer aborts
//! the whole refund and every contributor's funds stay in place.

pub mod authz;
pub mod engine;
pub mod rail;
pub mod reentry;

pub use authz::{Operation, RoleRequirement};
pub use engine::SettlementEngine;
pub use rail::{AccountBook, Payment, RejectingRail, TransferRail};
pub use reentry::ReentryGuard;
