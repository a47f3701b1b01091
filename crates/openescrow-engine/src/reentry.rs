//! Per-vault reentrancy exclusion.
//!
//! Every engine operation enters the guard for its target vault before
//! touching any state and exits it on the way out, success or failure. A
//! nested call against the same vault while an operation is in flight is
//! rejected outright instead of observing half-mutated state.

use std::collections::HashSet;

use openescrow_types::{EscrowError, Result, VaultId};

/// Tracks which vaults have an operation in flight.
#[derive(Debug, Default)]
pub struct ReentryGuard {
    in_flight: HashSet<VaultId>,
}

impl ReentryGuard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_flight: HashSet::new(),
        }
    }

    /// Mark `vault` as busy.
    ///
    /// # Errors
    /// Returns [`EscrowError::OperationInProgress`] if an operation on
    /// `vault` is already in flight.
    pub fn enter(&mut self, vault: VaultId) -> Result<()> {
        if !self.in_flight.insert(vault) {
            return Err(EscrowError::OperationInProgress(vault));
        }
        Ok(())
    }

    /// Release `vault`. Callers pair this with every successful `enter`,
    /// including on error paths.
    pub fn exit(&mut self, vault: VaultId) {
        self.in_flight.remove(&vault);
    }

    /// Whether an operation on `vault` is in flight.
    #[must_use]
    pub fn is_held(&self, vault: &VaultId) -> bool {
        self.in_flight.contains(vault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_exit_cycle() {
        let mut guard = ReentryGuard::new();
        let vault = VaultId::new();

        guard.enter(vault).unwrap();
        assert!(guard.is_held(&vault));
        guard.exit(vault);
        assert!(!guard.is_held(&vault));
        guard.enter(vault).unwrap();
    }

    #[test]
    fn nested_entry_rejected() {
        let mut guard = ReentryGuard::new();
        let vault = VaultId::new();
        guard.enter(vault).unwrap();

        let err = guard.enter(vault).unwrap_err();
        assert!(matches!(err, EscrowError::OperationInProgress(v) if v == vault));
        // The original hold is still in place.
        assert!(guard.is_held(&vault));
    }

    #[test]
    fn distinct_vaults_do_not_contend() {
        let mut guard = ReentryGuard::new();
        let a = VaultId::new();
        let b = VaultId::new();
        guard.enter(a).unwrap();
        guard.enter(b).unwrap();
        guard.exit(a);
        assert!(!guard.is_held(&a));
        assert!(guard.is_held(&b));
    }

    #[test]
    fn exit_of_unheld_vault_is_noop() {
        let mut guard = ReentryGuard::new();
        guard.exit(VaultId::new());
    }
}
