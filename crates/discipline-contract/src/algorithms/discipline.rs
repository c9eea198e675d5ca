//! # Discipline Logger
//!
//! Overwrites the latest score. No history is kept and no cadence is
//! enforced.

use crate::domain::{invariant_score_in_range, AccountState, ContractError};

/// Record `score` as the account's latest discipline score.
pub fn log_discipline(record: &mut AccountState, score: u64) -> Result<(), ContractError> {
    invariant_score_in_range(score)?;
    record.discipline_score = score;
    Ok(())
}
