//! # Penalty Engine
//!
//! Each penalty deducts a tenth of the current stake, rounded down, and
//! records a violation. Stakes below the divisor are left unchanged but the
//! violation still counts.

use super::bump;
use crate::domain::{invariant_active, AccountState, Address, ContractError, GlobalState};

/// Stake is divided by this to get the penalty (10%).
pub const PENALTY_DIVISOR: u64 = 10;

/// Result of one penalty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PenaltyOutcome {
    /// Amount deducted.
    pub penalty: u64,
    /// Stake after deduction.
    pub remaining_stake: u64,
    /// Violations after this penalty.
    pub violations: u64,
}

/// Penalty owed on `stake`.
#[must_use]
pub fn calculate_penalty(stake: u64) -> u64 {
    stake / PENALTY_DIVISOR
}

/// Deduct a penalty from an active commitment.
pub fn apply_penalty(
    global: &mut GlobalState,
    account: &Address,
    record: &mut AccountState,
) -> Result<PenaltyOutcome, ContractError> {
    invariant_active(account, record)?;

    let penalty = calculate_penalty(record.stake_amount);
    bump(&mut record.violations, "violations")?;
    bump(&mut global.total_penalties, "total_penalties")?;
    record.stake_amount -= penalty;

    Ok(PenaltyOutcome {
        penalty,
        remaining_stake: record.stake_amount,
        violations: record.violations,
    })
}
