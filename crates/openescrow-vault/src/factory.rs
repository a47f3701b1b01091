//! Vault factory — creates vaults and owns the vault registries.
//!
//! The factory fixes the oracle authority at construction; every vault it
//! creates is bound to that authority permanently. It also maintains the
//! global vault registry, a per-creator registry, and the
//! beneficiary → vault index (one vault per beneficiary).

use std::collections::HashMap;

use tracing::info;

use openescrow_types::{AccountId, EscrowError, Result, VaultId};

use crate::vault::Vault;

/// Creates and stores vaults for one oracle authority.
pub struct VaultFactory {
    /// The authority stamped into every created vault. Immutable.
    authority: AccountId,
    /// Contributor capacity stamped into every created vault.
    max_contributors: usize,
    /// All vaults by id.
    vaults: HashMap<VaultId, Vault>,
    /// One vault per beneficiary.
    by_beneficiary: HashMap<AccountId, VaultId>,
    /// Global creation-order registry.
    all: Vec<VaultId>,
    /// Per-creator registry.
    by_creator: HashMap<AccountId, Vec<VaultId>>,
}

impl VaultFactory {
    /// Create a factory bound to `authority`.
    #[must_use]
    pub fn new(authority: AccountId, max_contributors: usize) -> Self {
        Self {
            authority,
            max_contributors,
            vaults: HashMap::new(),
            by_beneficiary: HashMap::new(),
            all: Vec::new(),
            by_creator: HashMap::new(),
        }
    }

    /// Explicitly create a vault for `creator`, who becomes both the
    /// vault's beneficiary and its owner.
    ///
    /// # Errors
    /// - [`EscrowError::InvalidParticipant`] for the null identity
    /// - [`EscrowError::VaultExists`] if `creator` already has a vault
    pub fn create_vault(&mut self, creator: AccountId) -> Result<VaultId> {
        if creator.is_zero() {
            return Err(EscrowError::InvalidParticipant {
                reason: "null identity cannot create a vault".to_string(),
            });
        }
        if self.by_beneficiary.contains_key(&creator) {
            return Err(EscrowError::VaultExists(creator));
        }
        Ok(self.insert_vault(creator, creator))
    }

    /// Fetch the vault for `beneficiary`, creating it lazily with
    /// `owner` as the vault owner. The lazy path serves first deposits
    /// for beneficiaries nobody has explicitly created a vault for.
    pub fn get_or_create(&mut self, beneficiary: AccountId, owner: AccountId) -> &mut Vault {
        let id = match self.by_beneficiary.get(&beneficiary) {
            Some(id) => *id,
            None => self.insert_vault(beneficiary, owner),
        };
        self.vaults
            .get_mut(&id)
            .expect("registered vault id always resolves")
    }

    fn insert_vault(&mut self, beneficiary: AccountId, owner: AccountId) -> VaultId {
        let id = VaultId::new();
        let vault = Vault::new(id, beneficiary, owner, self.authority, self.max_contributors);
        self.vaults.insert(id, vault);
        self.by_beneficiary.insert(beneficiary, id);
        self.all.push(id);
        self.by_creator.entry(owner).or_default().push(id);
        info!(vault = %id, beneficiary = %beneficiary, owner = %owner, "vault created");
        id
    }

    /// Remove the vault for `beneficiary` from every registry, returning
    /// it. Only the engine's deposit rollback path calls this, to unwind a
    /// lazily created vault whose first collection failed.
    pub fn remove_vault(&mut self, beneficiary: &AccountId) -> Option<Vault> {
        let id = self.by_beneficiary.remove(beneficiary)?;
        let vault = self.vaults.remove(&id)?;
        self.all.retain(|v| v != &id);
        if let Some(ids) = self.by_creator.get_mut(&vault.owner()) {
            ids.retain(|v| v != &id);
        }
        info!(vault = %id, beneficiary = %beneficiary, "vault removed");
        Some(vault)
    }

    /// The vault for `beneficiary`, if one exists.
    #[must_use]
    pub fn vault(&self, beneficiary: &AccountId) -> Option<&Vault> {
        self.by_beneficiary
            .get(beneficiary)
            .and_then(|id| self.vaults.get(id))
    }

    /// Mutable access to the vault for `beneficiary`.
    pub fn vault_mut(&mut self, beneficiary: &AccountId) -> Option<&mut Vault> {
        let id = *self.by_beneficiary.get(beneficiary)?;
        self.vaults.get_mut(&id)
    }

    /// Look up a vault by id.
    #[must_use]
    pub fn get(&self, id: &VaultId) -> Option<&Vault> {
        self.vaults.get(id)
    }

    /// Vault ids created by `creator`, in creation order.
    #[must_use]
    pub fn vaults_of(&self, creator: &AccountId) -> &[VaultId] {
        self.by_creator.get(creator).map_or(&[], Vec::as_slice)
    }

    /// All vault ids in creation order.
    #[must_use]
    pub fn all_vaults(&self) -> &[VaultId] {
        &self.all
    }

    /// Number of vaults created.
    #[must_use]
    pub fn count(&self) -> usize {
        self.vaults.len()
    }

    /// The oracle authority every created vault is bound to.
    #[must_use]
    pub fn authority(&self) -> AccountId {
        self.authority
    }

    /// Iterate over all vaults (for invariant sweeps).
    pub fn iter(&self) -> impl Iterator<Item = &Vault> {
        self.vaults.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn make_factory() -> VaultFactory {
        VaultFactory::new(AccountId::random(), 3)
    }

    #[test]
    fn create_vault_registers_everywhere() {
        let mut factory = make_factory();
        let creator = AccountId::random();

        let id = factory.create_vault(creator).unwrap();

        assert_eq!(factory.count(), 1);
        assert_eq!(factory.all_vaults(), &[id]);
        assert_eq!(factory.vaults_of(&creator), &[id]);

        let vault = factory.get(&id).unwrap();
        assert_eq!(vault.beneficiary(), creator);
        assert_eq!(vault.owner(), creator);
        assert_eq!(vault.authority(), factory.authority());
    }

    #[test]
    fn duplicate_creation_rejected() {
        let mut factory = make_factory();
        let creator = AccountId::random();
        factory.create_vault(creator).unwrap();

        let err = factory.create_vault(creator).unwrap_err();
        assert!(matches!(err, EscrowError::VaultExists(b) if b == creator));
        assert_eq!(factory.count(), 1);
    }

    #[test]
    fn null_creator_rejected() {
        let mut factory = make_factory();
        let err = factory.create_vault(AccountId::ZERO).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidParticipant { .. }));
    }

    #[test]
    fn lazy_creation_binds_owner_and_authority() {
        let mut factory = make_factory();
        let authority = factory.authority();
        let seller = AccountId::random();
        let buyer = AccountId::random();

        let vault = factory.get_or_create(seller, buyer);
        assert_eq!(vault.beneficiary(), seller);
        assert_eq!(vault.owner(), buyer);
        assert_eq!(vault.authority(), authority);
        assert_eq!(factory.count(), 1);
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let mut factory = make_factory();
        let seller = AccountId::random();
        let buyer = AccountId::random();

        let id1 = factory.get_or_create(seller, buyer).id();
        // A later depositor does not replace the vault or its owner.
        let other = AccountId::random();
        let id2 = factory.get_or_create(seller, other).id();

        assert_eq!(id1, id2);
        assert_eq!(factory.count(), 1);
        assert_eq!(factory.get(&id1).unwrap().owner(), buyer);
    }

    #[test]
    fn vaults_are_independent() {
        let mut factory = make_factory();
        let s1 = AccountId::random();
        let s2 = AccountId::random();
        let buyer = AccountId::random();

        factory
            .get_or_create(s1, buyer)
            .deposit(buyer, Decimal::ONE)
            .unwrap();
        factory
            .get_or_create(s2, buyer)
            .deposit(buyer, Decimal::TWO)
            .unwrap();

        assert_eq!(factory.vault(&s1).unwrap().balance(), Decimal::ONE);
        assert_eq!(factory.vault(&s2).unwrap().balance(), Decimal::TWO);
        assert_eq!(factory.vaults_of(&buyer).len(), 2);
    }

    #[test]
    fn removal_unwinds_every_registry() {
        let mut factory = make_factory();
        let seller = AccountId::random();
        let buyer = AccountId::random();
        factory.get_or_create(seller, buyer);

        let removed = factory.remove_vault(&seller).unwrap();
        assert_eq!(removed.beneficiary(), seller);
        assert_eq!(factory.count(), 0);
        assert!(factory.all_vaults().is_empty());
        assert!(factory.vaults_of(&buyer).is_empty());
        assert!(factory.vault(&seller).is_none());

        // The beneficiary can be created again afterwards.
        factory.create_vault(seller).unwrap();
        assert_eq!(factory.count(), 1);
    }

    #[test]
    fn removing_an_unknown_beneficiary_is_noop() {
        let mut factory = make_factory();
        assert!(factory.remove_vault(&AccountId::random()).is_none());
    }

    #[test]
    fn unknown_beneficiary_has_no_vault() {
        let factory = make_factory();
        assert!(factory.vault(&AccountId::random()).is_none());
    }
}
