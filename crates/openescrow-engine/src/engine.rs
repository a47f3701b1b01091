//! The settlement engine façade.
//!
//! Single mutation surface over the vault factory, replay registry,
//! conservation ledger, and transfer rail. Every operation follows the
//! same discipline:
//!
//! 1. enter the per-vault reentry guard
//! 2. authorize the caller against the policy table
//! 3. validate preconditions (nothing mutated yet)
//! 4. mutate internal state to its post-condition
//! 5. settle the external leg through the transfer rail
//! 6. on a failed transfer, restore the pre-call snapshot (including
//!    un-registering a tentative settlement id) and report `TransferFailed`
//!
//! The internal state reaches its final value *before* the external
//! transfer, so a hypothetical re-entrant call would find the vault already
//! settled and fail on preconditions, not just on the guard.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use openescrow_ledger::{ConservationLedger, ReplayRegistry};
use openescrow_types::{
    AccountId, ContributorEntry, DeliveryRecord, EngineConfig, EscrowError, EscrowEvent,
    EventRecord, Result, SettlementId, VaultId,
};
use openescrow_vault::{Vault, VaultFactory, VaultState};

use crate::authz::{self, Operation};
use crate::rail::{Payment, TransferRail};
use crate::reentry::ReentryGuard;

/// Escrow settlement engine over a transfer rail `R`.
pub struct SettlementEngine<R: TransferRail> {
    factory: VaultFactory,
    replay: ReplayRegistry,
    conservation: ConservationLedger,
    guard: ReentryGuard,
    rail: R,
    events: Vec<EventRecord>,
}

impl<R: TransferRail> SettlementEngine<R> {
    /// Create an engine bound to the oracle `authority`.
    ///
    /// # Errors
    /// Returns [`EscrowError::Configuration`] for an invalid config or a
    /// null authority.
    pub fn new(authority: AccountId, rail: R, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        if authority.is_zero() {
            return Err(EscrowError::Configuration(
                "authority must not be the null identity".to_string(),
            ));
        }
        Ok(Self {
            factory: VaultFactory::new(authority, config.max_contributors),
            replay: ReplayRegistry::new(),
            conservation: ConservationLedger::new(),
            guard: ReentryGuard::new(),
            rail,
            events: Vec::new(),
        })
    }

    // =================================================================
    // Mutations
    // =================================================================

    /// Explicitly create a vault for `creator` (beneficiary and owner).
    ///
    /// # Errors
    /// Propagates factory errors: [`EscrowError::InvalidParticipant`],
    /// [`EscrowError::VaultExists`].
    pub fn create_vault(&mut self, creator: AccountId) -> Result<VaultId> {
        let vault_id = self.factory.create_vault(creator)?;
        self.emit(EscrowEvent::VaultCreated {
            vault_id,
            beneficiary: creator,
            creator,
        });
        Ok(vault_id)
    }

    /// Deposit `amount` from `caller` into the vault of `beneficiary`,
    /// creating the vault lazily for an unseen beneficiary.
    ///
    /// # Errors
    /// - [`EscrowError::InvalidParticipant`] for null identities or
    ///   self-dealing
    /// - [`EscrowError::InvalidAmount`] if `amount <= 0`
    /// - [`EscrowError::CapacityExceeded`] for a fourth distinct contributor
    /// - [`EscrowError::TransferFailed`] if the rail cannot collect; the
    ///   vault is rolled back to its pre-call state, and a vault created
    ///   lazily by this call is removed again
    pub fn deposit(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        amount: Decimal,
    ) -> Result<()> {
        authz::authorize_participant(caller, beneficiary)?;
        if amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount { amount });
        }

        let lazily_created = self.factory.vault(&beneficiary).is_none();
        let vault_id = self.factory.get_or_create(beneficiary, caller).id();
        self.guard.enter(vault_id)?;
        let result = self.deposit_locked(caller, beneficiary, amount, lazily_created);
        self.guard.exit(vault_id);
        result
    }

    fn deposit_locked(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        amount: Decimal,
        lazily_created: bool,
    ) -> Result<()> {
        let vault = self
            .factory
            .vault_mut(&beneficiary)
            .ok_or(EscrowError::VaultNotFound(beneficiary))?;
        let vault_id = vault.id();
        let snapshot = vault.clone();
        if let Err(err) = vault.deposit(caller, amount) {
            self.unwind_deposit(beneficiary, snapshot, lazily_created);
            return Err(err);
        }

        if let Err(err) = self.rail.collect(caller, amount) {
            warn!(beneficiary = %beneficiary, contributor = %caller, %amount,
                  "deposit collection failed, rolling back");
            self.unwind_deposit(beneficiary, snapshot, lazily_created);
            return Err(err);
        }

        // VaultCreated is only durable once the first collection lands, so
        // a failed first deposit leaves no trace of the beneficiary.
        if lazily_created {
            self.emit(EscrowEvent::VaultCreated {
                vault_id,
                beneficiary,
                creator: caller,
            });
        }
        self.conservation.record_deposit(amount);
        self.emit(EscrowEvent::Deposit {
            beneficiary,
            contributor: caller,
            amount,
        });
        Ok(())
    }

    fn unwind_deposit(&mut self, beneficiary: AccountId, snapshot: Vault, lazily_created: bool) {
        if lazily_created {
            self.factory.remove_vault(&beneficiary);
        } else {
            self.restore(beneficiary, snapshot);
        }
    }

    /// Declare requirements (and optional contact) for the current cycle.
    /// Re-declaration overwrites.
    ///
    /// # Errors
    /// - [`EscrowError::VaultNotFound`] for an unknown beneficiary
    /// - [`EscrowError::InvalidState`] if `caller` has not contributed, or
    ///   for empty requirements text
    /// - [`EscrowError::InsufficientFunds`] on a zero balance
    pub fn declare_requirements(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        requirements: impl Into<String>,
        contact: Option<String>,
    ) -> Result<()> {
        let vault_id = self.vault_id(&beneficiary)?;
        self.guard.enter(vault_id)?;
        let result = self.declare_locked(caller, beneficiary, requirements.into(), contact);
        self.guard.exit(vault_id);
        result
    }

    fn declare_locked(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        requirements: String,
        contact: Option<String>,
    ) -> Result<()> {
        let vault = self
            .factory
            .vault_mut(&beneficiary)
            .ok_or(EscrowError::VaultNotFound(beneficiary))?;
        authz::authorize(Operation::DeclareRequirements, caller, vault)?;
        vault.declare_requirements(requirements.clone(), contact.clone())?;

        self.emit(EscrowEvent::RequirementsSet {
            beneficiary,
            requirements,
            contact,
        });
        Ok(())
    }

    /// Record the caller's delivery hash against its own vault.
    ///
    /// # Errors
    /// - [`EscrowError::VaultNotFound`] if the caller has no vault
    /// - [`EscrowError::InsufficientFunds`] on a zero balance
    /// - [`EscrowError::InvalidState`] without requirements or on
    ///   resubmission
    pub fn submit_delivery(
        &mut self,
        caller: AccountId,
        delivery_hash: impl Into<String>,
    ) -> Result<()> {
        let vault_id = self.vault_id(&caller)?;
        self.guard.enter(vault_id)?;
        let result = self.delivery_locked(caller, delivery_hash.into());
        self.guard.exit(vault_id);
        result
    }

    fn delivery_locked(&mut self, caller: AccountId, delivery_hash: String) -> Result<()> {
        let vault = self
            .factory
            .vault_mut(&caller)
            .ok_or(EscrowError::VaultNotFound(caller))?;
        authz::authorize(Operation::SubmitDelivery, caller, vault)?;
        let now = Utc::now();
        vault.submit_delivery(delivery_hash.clone(), now)?;

        self.emit(EscrowEvent::DeliverySubmitted {
            beneficiary: caller,
            delivery_hash,
            timestamp: now,
        });
        Ok(())
    }

    /// Release the entire vault balance to `beneficiary`. Authority only.
    /// Returns the released amount.
    ///
    /// # Errors
    /// - [`EscrowError::Unauthorized`] unless `caller` is the authority
    /// - [`EscrowError::InsufficientFunds`] on a zero balance
    /// - [`EscrowError::DuplicateSettlementId`] for a replayed id
    /// - [`EscrowError::TransferFailed`] if the payout fails; the vault and
    ///   the settlement id are rolled back
    pub fn release(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        settlement_id: SettlementId,
    ) -> Result<Decimal> {
        let vault_id = self.vault_id(&beneficiary)?;
        self.guard.enter(vault_id)?;
        let result = self.release_locked(caller, beneficiary, settlement_id);
        self.guard.exit(vault_id);
        result
    }

    fn release_locked(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        settlement_id: SettlementId,
    ) -> Result<Decimal> {
        let vault = self
            .factory
            .vault_mut(&beneficiary)
            .ok_or(EscrowError::VaultNotFound(beneficiary))?;
        authz::authorize(Operation::Release, caller, vault)?;
        if !vault.state().can_settle() {
            return Err(EscrowError::InsufficientFunds { beneficiary });
        }
        // Replay gate last among the validations: a duplicate id leaves the
        // vault untouched.
        self.replay.register_once(&settlement_id)?;

        let snapshot = vault.clone();
        let (amount, _entries) = vault.clear();

        let payout = [Payment {
            recipient: beneficiary,
            amount,
        }];
        if let Err(err) = self.rail.disburse(&payout) {
            warn!(beneficiary = %beneficiary, %amount, settlement = %settlement_id,
                  "release payout failed, rolling back");
            self.replay.withdraw(&settlement_id);
            self.restore(beneficiary, snapshot);
            return Err(err);
        }

        self.conservation.record_payout(amount);
        info!(beneficiary = %beneficiary, %amount, settlement = %settlement_id, "released");
        self.emit(EscrowEvent::Released {
            beneficiary,
            amount,
            settlement_id,
        });
        Ok(amount)
    }

    /// Refund every contributor its exact recorded amount. Authority only,
    /// all-or-nothing. Returns the total refunded.
    ///
    /// # Errors
    /// - [`EscrowError::Unauthorized`] unless `caller` is the authority
    /// - [`EscrowError::InsufficientFunds`] on a zero balance
    /// - [`EscrowError::TransferFailed`] if any recipient refuses; no
    ///   contributor is paid and the vault is rolled back
    pub fn refund(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        reason: impl Into<String>,
    ) -> Result<Decimal> {
        let vault_id = self.vault_id(&beneficiary)?;
        self.guard.enter(vault_id)?;
        let result = self.refund_locked(caller, beneficiary, reason.into());
        self.guard.exit(vault_id);
        result
    }

    fn refund_locked(
        &mut self,
        caller: AccountId,
        beneficiary: AccountId,
        reason: String,
    ) -> Result<Decimal> {
        let vault = self
            .factory
            .vault_mut(&beneficiary)
            .ok_or(EscrowError::VaultNotFound(beneficiary))?;
        authz::authorize(Operation::Refund, caller, vault)?;
        if !vault.state().can_settle() {
            return Err(EscrowError::InsufficientFunds { beneficiary });
        }

        let snapshot = vault.clone();
        let (total, entries) = vault.clear();

        let payments: Vec<Payment> = entries
            .iter()
            .map(|entry| Payment {
                recipient: entry.contributor,
                amount: entry.amount,
            })
            .collect();
        if let Err(err) = self.rail.disburse(&payments) {
            warn!(beneficiary = %beneficiary, %total,
                  "refund payout failed, rolling back all contributors");
            self.restore(beneficiary, snapshot);
            return Err(err);
        }

        self.conservation.record_payout(total);
        info!(beneficiary = %beneficiary, %total, contributors = entries.len(), "refunded");
        for entry in entries {
            self.emit(EscrowEvent::Refunded {
                beneficiary,
                contributor: entry.contributor,
                amount: entry.amount,
                reason: reason.clone(),
            });
        }
        Ok(total)
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Escrowed balance for `beneficiary`. Unknown beneficiaries hold zero.
    #[must_use]
    pub fn balance_of(&self, beneficiary: &AccountId) -> Decimal {
        self.factory
            .vault(beneficiary)
            .map_or(Decimal::ZERO, Vault::balance)
    }

    /// Contributor entries for `beneficiary`, in insertion order.
    #[must_use]
    pub fn contributors(&self, beneficiary: &AccountId) -> Vec<ContributorEntry> {
        self.factory
            .vault(beneficiary)
            .map_or_else(Vec::new, |vault| vault.contributors().to_vec())
    }

    /// Distinct contributor count for `beneficiary`.
    #[must_use]
    pub fn contributor_count(&self, beneficiary: &AccountId) -> usize {
        self.factory
            .vault(beneficiary)
            .map_or(0, Vault::contributor_count)
    }

    /// Whether `id` has been consumed by a finalized release.
    #[must_use]
    pub fn settlement_used(&self, id: &SettlementId) -> bool {
        self.replay.is_used(id)
    }

    /// Current requirements text for `beneficiary`, if declared.
    #[must_use]
    pub fn requirements_of(&self, beneficiary: &AccountId) -> Option<String> {
        self.factory
            .vault(beneficiary)
            .and_then(|vault| vault.requirements().map(str::to_string))
    }

    /// Current contact info for `beneficiary`, if declared.
    #[must_use]
    pub fn contact_of(&self, beneficiary: &AccountId) -> Option<String> {
        self.factory
            .vault(beneficiary)
            .and_then(|vault| vault.contact().map(str::to_string))
    }

    /// Current delivery record for `beneficiary`, if submitted.
    #[must_use]
    pub fn delivery_of(&self, beneficiary: &AccountId) -> Option<DeliveryRecord> {
        self.factory
            .vault(beneficiary)
            .and_then(|vault| vault.delivery().cloned())
    }

    /// Derived lifecycle state of the vault for `beneficiary`.
    #[must_use]
    pub fn vault_state(&self, beneficiary: &AccountId) -> Option<VaultState> {
        self.factory.vault(beneficiary).map(Vault::state)
    }

    /// Vault ids created by `creator`, in creation order.
    #[must_use]
    pub fn vaults_of(&self, creator: &AccountId) -> &[VaultId] {
        self.factory.vaults_of(creator)
    }

    /// The oracle authority this engine is bound to.
    #[must_use]
    pub fn authority(&self) -> AccountId {
        self.factory.authority()
    }

    /// The append-only event log.
    #[must_use]
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// The transfer rail (external account view for callers and tests).
    #[must_use]
    pub fn rail(&self) -> &R {
        &self.rail
    }

    /// Mutable access to the transfer rail.
    pub fn rail_mut(&mut self) -> &mut R {
        &mut self.rail
    }

    /// Verify escrow-wide money conservation: the sum of all vault
    /// balances must equal deposits minus payouts since genesis. Also
    /// checks each vault's internal invariants.
    ///
    /// # Errors
    /// Returns [`EscrowError::ConservationViolation`] or the first vault
    /// invariant failure.
    pub fn verify_conservation(&self) -> Result<()> {
        let mut escrowed = Decimal::ZERO;
        for vault in self.factory.iter() {
            vault.check_invariants()?;
            escrowed += vault.balance();
        }
        self.conservation.verify(escrowed)
    }

    // =================================================================
    // Internals
    // =================================================================

    fn vault_id(&self, beneficiary: &AccountId) -> Result<VaultId> {
        self.factory
            .vault(beneficiary)
            .map(Vault::id)
            .ok_or(EscrowError::VaultNotFound(*beneficiary))
    }

    fn restore(&mut self, beneficiary: AccountId, snapshot: Vault) {
        if let Some(vault) = self.factory.vault_mut(&beneficiary) {
            *vault = snapshot;
        }
    }

    fn emit(&mut self, event: EscrowEvent) {
        let sequence = self.events.len() as u64 + 1;
        let record = EventRecord::new(sequence, event);
        info!(seq = sequence, kind = %record.event.kind(), "event");
        self.events.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rail::AccountBook;

    fn funded_engine(accounts: &[(AccountId, Decimal)]) -> SettlementEngine<AccountBook> {
        let mut rail = AccountBook::new();
        for (account, amount) in accounts {
            rail.fund(*account, *amount);
        }
        SettlementEngine::new(AccountId::random(), rail, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn engine_rejects_null_authority() {
        let err = SettlementEngine::new(
            AccountId::ZERO,
            AccountBook::new(),
            &EngineConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, EscrowError::Configuration(_)));
    }

    #[test]
    fn deposit_moves_value_onto_the_rail() {
        let buyer = AccountId::random();
        let seller = AccountId::random();
        let mut engine = funded_engine(&[(buyer, Decimal::TEN)]);

        engine.deposit(buyer, seller, Decimal::ONE).unwrap();

        assert_eq!(engine.balance_of(&seller), Decimal::ONE);
        assert_eq!(engine.rail().balance(&buyer), Decimal::new(9, 0));
        assert_eq!(engine.vault_state(&seller), Some(VaultState::Funded));
        engine.verify_conservation().unwrap();
    }

    #[test]
    fn deposit_with_empty_external_account_rolls_back() {
        let buyer = AccountId::random();
        let seller = AccountId::random();
        let mut engine = funded_engine(&[]);

        let err = engine.deposit(buyer, seller, Decimal::ONE).unwrap_err();
        assert!(matches!(err, EscrowError::TransferFailed { .. }));
        // The lazily created vault is unwound with the deposit: no vault,
        // no registry entries, no events.
        assert!(engine.vault_state(&seller).is_none());
        assert_eq!(engine.balance_of(&seller), Decimal::ZERO);
        assert!(engine.vaults_of(&buyer).is_empty());
        assert!(engine.events().is_empty());
        engine.verify_conservation().unwrap();
    }

    #[test]
    fn failed_top_up_keeps_the_existing_vault() {
        let buyer = AccountId::random();
        let broke = AccountId::random();
        let seller = AccountId::random();
        let mut engine = funded_engine(&[(buyer, Decimal::TEN)]);
        engine.deposit(buyer, seller, Decimal::ONE).unwrap();

        let err = engine.deposit(broke, seller, Decimal::ONE).unwrap_err();
        assert!(matches!(err, EscrowError::TransferFailed { .. }));
        // Only the failed contribution is rolled back.
        assert_eq!(engine.vault_state(&seller), Some(VaultState::Funded));
        assert_eq!(engine.balance_of(&seller), Decimal::ONE);
        assert_eq!(engine.contributor_count(&seller), 1);
        engine.verify_conservation().unwrap();
    }

    #[test]
    fn deposit_rejects_zero_amount_before_creating_a_vault() {
        let buyer = AccountId::random();
        let seller = AccountId::random();
        let mut engine = funded_engine(&[(buyer, Decimal::TEN)]);

        let err = engine.deposit(buyer, seller, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidAmount { .. }));
        assert!(engine.vault_state(&seller).is_none());
    }

    #[test]
    fn lazy_vault_creation_emits_one_created_event() {
        let buyer = AccountId::random();
        let seller = AccountId::random();
        let mut engine = funded_engine(&[(buyer, Decimal::TEN)]);

        engine.deposit(buyer, seller, Decimal::ONE).unwrap();
        engine.deposit(buyer, seller, Decimal::ONE).unwrap();

        let created: Vec<_> = engine
            .events()
            .iter()
            .filter(|r| matches!(r.event, EscrowEvent::VaultCreated { .. }))
            .collect();
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn event_log_sequences_and_hashes() {
        let buyer = AccountId::random();
        let seller = AccountId::random();
        let mut engine = funded_engine(&[(buyer, Decimal::TEN)]);
        engine.deposit(buyer, seller, Decimal::ONE).unwrap();
        engine
            .declare_requirements(buyer, seller, "req", None)
            .unwrap();

        let events = engine.events();
        assert!(!events.is_empty());
        for (i, record) in events.iter().enumerate() {
            assert_eq!(record.sequence, i as u64 + 1);
            assert!(record.verify_hash());
        }
    }

    #[test]
    fn queries_on_unknown_beneficiary() {
        let engine = funded_engine(&[]);
        let nobody = AccountId::random();
        assert_eq!(engine.balance_of(&nobody), Decimal::ZERO);
        assert!(engine.contributors(&nobody).is_empty());
        assert!(engine.vault_state(&nobody).is_none());
        assert!(engine.requirements_of(&nobody).is_none());
        assert!(engine.contact_of(&nobody).is_none());
    }
}
