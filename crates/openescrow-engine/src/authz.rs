//! Operation → role policy table.
//!
//! Every engine operation is authorized through one explicit table rather
//! than ad-hoc checks scattered through the call sites. The table is the
//! single place to read off who may do what:
//!
//! | Operation           | Required role |
//! |---------------------|---------------|
//! | CreateVault         | Open          |
//! | Deposit             | Participant   |
//! | DeclareRequirements | Contributor   |
//! | SubmitDelivery      | Beneficiary   |
//! | Release             | Authority     |
//! | Refund              | Authority     |

use openescrow_types::{AccountId, EscrowError, Result};
use openescrow_vault::Vault;

/// Mutating operations exposed by the settlement engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateVault,
    Deposit,
    DeclareRequirements,
    SubmitDelivery,
    Release,
    Refund,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CreateVault => "create_vault",
            Self::Deposit => "deposit",
            Self::DeclareRequirements => "declare_requirements",
            Self::SubmitDelivery => "submit_delivery",
            Self::Release => "release",
            Self::Refund => "refund",
        };
        write!(f, "{name}")
    }
}

/// Who may invoke an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRequirement {
    /// Any non-null identity.
    Open,
    /// Any valid depositor: non-null and not the vault's beneficiary.
    Participant,
    /// An identity recorded as a contributor in the current cycle.
    Contributor,
    /// The vault's beneficiary itself.
    Beneficiary,
    /// The oracle authority the vault is bound to.
    Authority,
}

/// The role required for each operation.
#[must_use]
pub fn required_role(op: Operation) -> RoleRequirement {
    match op {
        Operation::CreateVault => RoleRequirement::Open,
        Operation::Deposit => RoleRequirement::Participant,
        Operation::DeclareRequirements => RoleRequirement::Contributor,
        Operation::SubmitDelivery => RoleRequirement::Beneficiary,
        Operation::Release | Operation::Refund => RoleRequirement::Authority,
    }
}

/// Check that `caller` satisfies the Participant role against
/// `beneficiary`. Split out so deposits can be screened before the lazy
/// vault-creation path runs.
///
/// # Errors
/// Returns [`EscrowError::InvalidParticipant`] for the null identity or a
/// beneficiary depositing into its own vault.
pub fn authorize_participant(caller: AccountId, beneficiary: AccountId) -> Result<()> {
    if caller.is_zero() {
        return Err(EscrowError::InvalidParticipant {
            reason: "null identity may not participate".to_string(),
        });
    }
    if beneficiary.is_zero() {
        return Err(EscrowError::InvalidParticipant {
            reason: "null identity may not be a beneficiary".to_string(),
        });
    }
    if caller == beneficiary {
        return Err(EscrowError::InvalidParticipant {
            reason: "beneficiary may not deposit into its own vault".to_string(),
        });
    }
    Ok(())
}

/// Authorize `caller` for `op` against `vault` per the policy table.
///
/// # Errors
/// - [`EscrowError::InvalidParticipant`] for Participant violations
/// - [`EscrowError::InvalidState`] when a Contributor role is required and
///   the caller has not contributed this cycle
/// - [`EscrowError::Unauthorized`] for Beneficiary / Authority mismatches
pub fn authorize(op: Operation, caller: AccountId, vault: &Vault) -> Result<()> {
    match required_role(op) {
        RoleRequirement::Open => {
            if caller.is_zero() {
                return Err(EscrowError::InvalidParticipant {
                    reason: "null identity may not participate".to_string(),
                });
            }
            Ok(())
        }
        RoleRequirement::Participant => authorize_participant(caller, vault.beneficiary()),
        RoleRequirement::Contributor => {
            if !vault.is_contributor(&caller) {
                return Err(EscrowError::InvalidState {
                    reason: format!("{caller} has not contributed this cycle"),
                });
            }
            Ok(())
        }
        RoleRequirement::Beneficiary => {
            if caller != vault.beneficiary() {
                return Err(EscrowError::Unauthorized {
                    operation: op.to_string(),
                    caller,
                });
            }
            Ok(())
        }
        RoleRequirement::Authority => {
            if caller != vault.authority() {
                return Err(EscrowError::Unauthorized {
                    operation: op.to_string(),
                    caller,
                });
            }
            Ok(())
        }
    }
}
