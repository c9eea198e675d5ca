//! # Algorithms Module
//!
//! Pure state-transition algorithms. Each one mutates working copies of the
//! records it touches and reports what happened; committing is the host's job.

pub mod bridge;
pub mod discipline;
pub mod lifecycle;
pub mod penalty;

pub use bridge::record_bridge_intent;
pub use discipline::log_discipline;
pub use lifecycle::{create_commitment, verify_session, SessionOutcome};
pub use penalty::{apply_penalty, calculate_penalty, PenaltyOutcome, PENALTY_DIVISOR};

use crate::domain::ContractError;

/// Increment an append-only counter.
pub(crate) fn bump(counter: &mut u64, name: &'static str) -> Result<(), ContractError> {
    *counter = counter
        .checked_add(1)
        .ok_or(ContractError::CounterOverflow(name))?;
    Ok(())
}
