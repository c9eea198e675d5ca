//! # Contract Events
//!
//! Facts emitted by accepted invocations. They are appended to the
//! transaction log together with the raw call, and are what an external
//! indexer reads to rebuild history the contract itself does not keep.

use crate::domain::{Address, Digest};
use serde::{Deserialize, Serialize};

/// Event emitted by an accepted invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContractEvent {
    /// Application created.
    ApplicationCreated {
        /// Operator account.
        admin: Address,
    },
    /// Application removed by the admin.
    ApplicationDeleted,
    /// Account allocated its local record.
    OptedIn {
        /// Account.
        account: Address,
    },
    /// Account released its local record.
    ClosedOut {
        /// Account.
        account: Address,
    },
    /// Account record dropped by a clear-state call.
    StateCleared {
        /// Account.
        account: Address,
        /// Stake left behind in escrow.
        abandoned_stake: u64,
    },
    /// Stake escrowed against a commitment.
    CommitmentCreated {
        /// Staking account.
        account: Address,
        /// Commitment metadata digest.
        commitment_hash: Digest,
        /// Escrowed amount.
        stake: u64,
        /// Declared duration, as submitted.
        duration: u64,
    },
    /// Commitment resolved by the operator.
    SessionVerified {
        /// Account.
        account: Address,
        /// Outcome.
        success: bool,
        /// Amount paid back to the account.
        refunded: u64,
        /// Amount kept by the contract.
        forfeited: u64,
    },
    /// Penalty deducted from an active stake.
    PenaltyApplied {
        /// Account.
        account: Address,
        /// Deducted amount.
        penalty: u64,
        /// Stake after deduction.
        remaining_stake: u64,
        /// Violation count after this penalty.
        violations: u64,
    },
    /// Latest discipline score recorded.
    DisciplineLogged {
        /// Account.
        account: Address,
        /// Score.
        score: u64,
    },
    /// Bridge payout requested.
    BridgeIntentRecorded {
        /// Requesting account.
        account: Address,
        /// Hashed payout reference.
        reference: Digest,
        /// Amount transferred to escrow with the request.
        amount: u64,
    },
    /// Bridge payout attested by the operator.
    BridgeSettled {
        /// Account paid out.
        account: Address,
        /// Hashed settlement reference.
        reference: Digest,
    },
}

impl ContractEvent {
    /// Stable event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApplicationCreated { .. } => "application_created",
            Self::ApplicationDeleted => "application_deleted",
            Self::OptedIn { .. } => "opted_in",
            Self::ClosedOut { .. } => "closed_out",
            Self::StateCleared { .. } => "state_cleared",
            Self::CommitmentCreated { .. } => "commitment_created",
            Self::SessionVerified { .. } => "session_verified",
            Self::PenaltyApplied { .. } => "penalty_applied",
            Self::DisciplineLogged { .. } => "discipline_logged",
            Self::BridgeIntentRecorded { .. } => "bridge_intent_recorded",
            Self::BridgeSettled { .. } => "bridge_settled",
        }
    }
}
