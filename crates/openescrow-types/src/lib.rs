//! # openescrow-types
//!
//! Shared types, errors, and configuration for the **OpenEscrow** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`VaultId`], [`SettlementId`]
//! - **Contribution model**: [`ContributorEntry`]
//! - **Delivery model**: [`DeliveryRecord`]
//! - **Event model**: [`EscrowEvent`], [`EventRecord`]
//! - **Judgment model**: [`Verdict`], [`VerdictOutcome`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`EscrowError`] with `ESC_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod contribution;
pub mod delivery;
pub mod error;
pub mod event;
pub mod ids;
pub mod verdict;

// Re-export all primary types at crate root for ergonomic imports:
//   use openescrow_types::{AccountId, EscrowError, EventRecord, ...};

pub use config::*;
pub use contribution::*;
pub use delivery::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use verdict::*;

// Constants are accessed via `openescrow_types::constants::FOO`
// (not re-exported to avoid name collisions).
