//! # Domain Invariants
//!
//! Business rules for the discipline contract.
//!
//! | Invariant | Rule |
//! |-----------|------|
//! | Admin gate | caller == `GlobalState.admin` |
//! | Status edges | NONE/COMPLETED/FAILED -> ACTIVE -> COMPLETED/FAILED |
//! | Positive stake | stake > 0 to enter ACTIVE |
//! | Close-out | status != ACTIVE |
//! | Score range | 0 <= score <= 100 |

use super::entities::{AccountState, GlobalState};
use super::errors::ContractError;
use super::value_objects::{Address, CommitmentStatus};

/// Lowest accepted discipline score.
pub const MIN_DISCIPLINE_SCORE: u64 = 0;

/// Highest accepted discipline score.
pub const MAX_DISCIPLINE_SCORE: u64 = 100;

/// Invariant: only the stored admin may call operator methods.
pub fn invariant_admin(global: &GlobalState, caller: &Address) -> Result<(), ContractError> {
    if !global.is_admin(caller) {
        return Err(ContractError::Unauthorized(*caller));
    }
    Ok(())
}

/// Invariant: commitment status only moves along legal edges.
pub fn invariant_status_transition(
    from: CommitmentStatus,
    to: CommitmentStatus,
) -> Result<(), ContractError> {
    if !from.can_transition_to(to) {
        return Err(ContractError::InvalidStatusTransition { from, to });
    }
    Ok(())
}

/// Invariant: a new commitment needs a positive stake and no outstanding one.
pub fn invariant_can_commit(
    account: &Address,
    record: &AccountState,
    stake: u64,
) -> Result<(), ContractError> {
    if record.commitment_status.is_active() {
        return Err(ContractError::CommitmentActive(*account));
    }
    if stake == 0 {
        return Err(ContractError::ZeroStake);
    }
    Ok(())
}

/// Invariant: operator actions on a commitment need it to be active.
pub fn invariant_active(account: &Address, record: &AccountState) -> Result<(), ContractError> {
    if !record.commitment_status.is_active() {
        return Err(ContractError::CommitmentNotActive {
            account: *account,
            status: record.commitment_status,
        });
    }
    Ok(())
}

/// Invariant: an account cannot leave with an unresolved stake.
pub fn invariant_closeout_allowed(
    account: &Address,
    record: &AccountState,
) -> Result<(), ContractError> {
    if record.commitment_status.is_active() {
        return Err(ContractError::CommitmentActive(*account));
    }
    Ok(())
}

/// Invariant: discipline score lies in `[0, 100]`.
pub fn invariant_score_in_range(score: u64) -> Result<(), ContractError> {
    if !(MIN_DISCIPLINE_SCORE..=MAX_DISCIPLINE_SCORE).contains(&score) {
        return Err(ContractError::ScoreOutOfRange(score));
    }
    Ok(())
}
