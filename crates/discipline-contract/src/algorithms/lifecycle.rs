//! # Commitment Lifecycle
//!
//! NONE -> ACTIVE -> {COMPLETED, FAILED} -> ACTIVE again on re-stake.

use super::bump;
use crate::domain::{
    invariant_active, invariant_can_commit, invariant_status_transition, AccountState, Address,
    CommitmentStatus, ContractError, Digest, GlobalState,
};

/// How an active commitment was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Stake goes back to the account.
    Completed {
        /// Amount of the outbound transfer.
        refund: u64,
    },
    /// Stake stays in the contract balance.
    Failed {
        /// Amount kept.
        forfeited: u64,
    },
}

/// Escrow `stake` against `commitment_hash`.
///
/// The caller has already checked that `stake` arrived in the contract
/// account as part of the same group.
pub fn create_commitment(
    global: &mut GlobalState,
    account: &Address,
    record: &mut AccountState,
    commitment_hash: Digest,
    stake: u64,
) -> Result<(), ContractError> {
    invariant_can_commit(account, record, stake)?;
    invariant_status_transition(record.commitment_status, CommitmentStatus::Active)?;
    bump(&mut global.total_commitments, "total_commitments")?;

    record.stake_amount = stake;
    record.commitment_hash = Some(commitment_hash);
    record.commitment_status = CommitmentStatus::Active;
    Ok(())
}

/// Resolve an active commitment. The stake is zeroed either way.
pub fn verify_session(
    account: &Address,
    record: &mut AccountState,
    success: bool,
) -> Result<SessionOutcome, ContractError> {
    invariant_active(account, record)?;

    let next = if success {
        CommitmentStatus::Completed
    } else {
        CommitmentStatus::Failed
    };
    invariant_status_transition(record.commitment_status, next)?;

    let stake = std::mem::take(&mut record.stake_amount);
    record.commitment_status = next;

    Ok(if success {
        SessionOutcome::Completed { refund: stake }
    } else {
        SessionOutcome::Failed { forfeited: stake }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    fn active(stake: u64) -> AccountState {
        AccountState {
            stake_amount: stake,
            commitment_status: CommitmentStatus::Active,
            commitment_hash: Some(Digest::new([5u8; 32])),
            ..AccountState::default()
        }
    }

    #[test]
    fn test_create_commitment_activates() {
        let mut global = GlobalState::genesis(addr(1));
        let mut record = AccountState::default();
        create_commitment(&mut global, &addr(2), &mut record, Digest::new([9u8; 32]), 1_000_000)
            .unwrap();

        assert_eq!(record.commitment_status, CommitmentStatus::Active);
        assert_eq!(record.stake_amount, 1_000_000);
        assert_eq!(record.commitment_hash, Some(Digest::new([9u8; 32])));
        assert_eq!(global.total_commitments, 1);
    }

    #[test]
    fn test_create_commitment_rejected_while_active() {
        let mut global = GlobalState::genesis(addr(1));
        let mut record = active(10);
        let before = record.clone();
        let err = create_commitment(&mut global, &addr(2), &mut record, Digest::default(), 5)
            .unwrap_err();

        assert_eq!(err, ContractError::CommitmentActive(addr(2)));
        assert_eq!(record, before);
        assert_eq!(global.total_commitments, 0);
    }

    #[test]
    fn test_restake_after_completed_and_failed() {
        for status in [CommitmentStatus::Completed, CommitmentStatus::Failed] {
            let mut global = GlobalState::genesis(addr(1));
            let mut record = AccountState {
                commitment_status: status,
                violations: 2,
                ..AccountState::default()
            };
            create_commitment(&mut global, &addr(2), &mut record, Digest::default(), 7).unwrap();
            assert_eq!(record.commitment_status, CommitmentStatus::Active);
            assert_eq!(record.violations, 2);
        }
    }

    #[test]
    fn test_verify_success_returns_stake() {
        let mut record = active(1_000_000);
        let outcome = verify_session(&addr(2), &mut record, true).unwrap();

        assert_eq!(outcome, SessionOutcome::Completed { refund: 1_000_000 });
        assert_eq!(record.stake_amount, 0);
        assert_eq!(record.commitment_status, CommitmentStatus::Completed);
    }

    #[test]
    fn test_verify_failure_forfeits_stake() {
        let mut record = active(400);
        let outcome = verify_session(&addr(2), &mut record, false).unwrap();

        assert_eq!(outcome, SessionOutcome::Failed { forfeited: 400 });
        assert_eq!(record.stake_amount, 0);
        assert_eq!(record.commitment_status, CommitmentStatus::Failed);
    }

    #[test]
    fn test_verify_requires_active() {
        let mut record = AccountState::default();
        assert!(matches!(
            verify_session(&addr(2), &mut record, true),
            Err(ContractError::CommitmentNotActive { .. })
        ));
    }
}
