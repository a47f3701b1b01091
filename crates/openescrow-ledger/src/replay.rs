//! Settlement replay registry — prevents double release.
//!
//! A settlement identifier, once finalized, stays registered forever:
//! release for a given identifier executes at most once system-wide. The
//! check-and-set in [`ReplayRegistry::register_once`] is the atomic gate;
//! callers hold the engine's single-writer lock while invoking it.

use std::collections::HashSet;

use tracing::debug;

use openescrow_types::{EscrowError, Result, SettlementId};

/// Global monotonic set of finalized settlement identifiers.
#[derive(Debug, Default)]
pub struct ReplayRegistry {
    used: HashSet<SettlementId>,
}

impl ReplayRegistry {
    /// Create an empty registry. Tests construct a fresh instance per run;
    /// production wires exactly one into the engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            used: HashSet::new(),
        }
    }

    /// Record `id` iff it was not already present.
    ///
    /// # Errors
    /// Returns [`EscrowError::DuplicateSettlementId`] if `id` has already
    /// been registered.
    pub fn register_once(&mut self, id: &SettlementId) -> Result<()> {
        if self.used.contains(id) {
            return Err(EscrowError::DuplicateSettlementId(id.clone()));
        }
        self.used.insert(id.clone());
        debug!(settlement = %id, "settlement id registered");
        Ok(())
    }

    /// Withdraw a tentatively registered id.
    ///
    /// Only the engine's transfer-failure rollback path calls this: the
    /// settlement never finalized, so removing it keeps the registry
    /// monotonic over *finalized* identifiers. Returns whether the id was
    /// present.
    pub fn withdraw(&mut self, id: &SettlementId) -> bool {
        self.used.remove(id)
    }

    /// Whether `id` has been registered.
    #[must_use]
    pub fn is_used(&self, id: &SettlementId) -> bool {
        self.used.contains(id)
    }

    /// Number of registered identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// Whether no identifier has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SettlementId {
        SettlementId::new(s).unwrap()
    }

    #[test]
    fn first_registration_ok() {
        let mut registry = ReplayRegistry::new();
        let id = sid("tx-1");
        registry.register_once(&id).unwrap();
        assert!(registry.is_used(&id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_blocked() {
        let mut registry = ReplayRegistry::new();
        let id = sid("tx-1");
        registry.register_once(&id).unwrap();

        let err = registry.register_once(&id).unwrap_err();
        assert!(
            matches!(err, EscrowError::DuplicateSettlementId(ref d) if d == &id),
            "Expected DuplicateSettlementId, got: {err:?}"
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_ids_register_independently() {
        let mut registry = ReplayRegistry::new();
        registry.register_once(&sid("tx-1")).unwrap();
        registry.register_once(&sid("tx-2")).unwrap();
        registry.register_once(&sid("tx-3")).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn withdraw_reopens_id() {
        let mut registry = ReplayRegistry::new();
        let id = sid("tx-1");
        registry.register_once(&id).unwrap();

        assert!(registry.withdraw(&id));
        assert!(!registry.is_used(&id));
        // The id can be registered again after rollback.
        registry.register_once(&id).unwrap();
    }

    #[test]
    fn withdraw_of_unknown_id_is_noop() {
        let mut registry = ReplayRegistry::new();
        assert!(!registry.withdraw(&sid("tx-unknown")));
    }

    #[test]
    fn empty_registry() {
        let registry = ReplayRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.is_used(&sid("tx-1")));
    }
}
