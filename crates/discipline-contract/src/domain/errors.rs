//! # Domain Errors
//!
//! Error types for the discipline contract.
//!
//! Every failure rejects the whole invocation (and its group). The
//! [`ErrorCategory`] of an error is what callers use to decide whether a
//! corrected resubmission makes sense.

use super::value_objects::{Address, CommitmentStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Coarse failure taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Malformed invocation: arguments, group shape, funding transfer.
    PreconditionFailure,
    /// Non-admin caller on an admin-gated method.
    AuthorizationFailure,
    /// Account is in an incompatible lifecycle state.
    StateConflict,
    /// Discipline score outside `[0, 100]`.
    RangeFailure,
    /// Escrow cannot fund a transfer, or a counter would overflow.
    ResourceExhaustion,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreconditionFailure => "precondition_failure",
            Self::AuthorizationFailure => "authorization_failure",
            Self::StateConflict => "state_conflict",
            Self::RangeFailure => "range_failure",
            Self::ResourceExhaustion => "resource_exhaustion",
        };
        f.write_str(name)
    }
}

/// Errors reported by the host ledger that moves funds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Sender balance does not cover the transfer.
    #[error("insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// Account being debited.
        account: Address,
        /// Amount the transfer needs.
        required: u64,
        /// Balance at the time of the transfer.
        available: u64,
    },

    /// Receiver balance would overflow.
    #[error("balance overflow in {0}")]
    BalanceOverflow(Address),

    /// Ledger backend is unavailable.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Discipline contract error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Application call carried no arguments.
    #[error("missing method selector")]
    MissingMethodSelector,

    /// Argument 0 did not name a known method.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// Fewer arguments than the method needs.
    #[error("{method}: expected at least {expected} arguments, got {got}")]
    InsufficientArguments {
        /// Method name.
        method: &'static str,
        /// Minimum argument count, selector included.
        expected: usize,
        /// Arguments supplied, selector included.
        got: usize,
    },

    /// An argument could not be decoded.
    #[error("{method}: malformed argument {index}: {reason}")]
    MalformedArgument {
        /// Method name.
        method: &'static str,
        /// Argument position.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Group has the wrong number of operations.
    #[error("invalid group size: expected {expected}, got {got}")]
    InvalidGroupSize {
        /// Required size.
        expected: usize,
        /// Submitted size.
        got: usize,
    },

    /// Group composition is not acceptable.
    #[error("invalid group shape: {0}")]
    InvalidGroupShape(String),

    /// Group member at `index` must be a payment.
    #[error("group member {0} is not a payment")]
    ExpectedPayment(usize),

    /// Funding payment does not target the contract account.
    #[error("payment receiver {got} is not the application account {expected}")]
    PaymentReceiverMismatch {
        /// Application account.
        expected: Address,
        /// Actual receiver.
        got: Address,
    },

    /// Funding payment was sent by someone other than the caller.
    #[error("payment sender {payer} does not match caller {caller}")]
    PaymentSenderMismatch {
        /// Caller of the application.
        caller: Address,
        /// Payment sender.
        payer: Address,
    },

    /// Funding payment carried no value.
    #[error("payment amount must be greater than zero")]
    ZeroPayment,

    /// Logic is immutable once deployed.
    #[error("application update is not permitted")]
    UpdateRejected,

    /// Caller is not the stored admin.
    #[error("unauthorized caller: {0}")]
    Unauthorized(Address),

    /// Account has no local record.
    #[error("account not opted in: {0}")]
    NotOptedIn(Address),

    /// Account already holds a local record.
    #[error("account already opted in: {0}")]
    AlreadyOptedIn(Address),

    /// Account holds an unresolved commitment.
    #[error("account has an active commitment: {0}")]
    CommitmentActive(Address),

    /// Method requires an active commitment.
    #[error("account {account} has no active commitment (status {status})")]
    CommitmentNotActive {
        /// Target account.
        account: Address,
        /// Status found.
        status: CommitmentStatus,
    },

    /// Commitment status edge is not legal.
    #[error("invalid commitment transition: {from} -> {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: CommitmentStatus,
        /// Requested status.
        to: CommitmentStatus,
    },

    /// A commitment needs a positive stake.
    #[error("stake must be greater than zero")]
    ZeroStake,

    /// Discipline score outside the accepted range.
    #[error("discipline score out of range: {0} (accepted 0..=100)")]
    ScoreOutOfRange(u64),

    /// Refund cannot be paid out of escrow.
    #[error("refund unfunded: required {required}, spendable {spendable}")]
    RefundUnfunded {
        /// Amount of the outbound transfer.
        required: u64,
        /// Escrow balance above the reserve.
        spendable: u64,
    },

    /// A global counter reached its maximum.
    #[error("counter overflow: {0}")]
    CounterOverflow(&'static str),

    /// Application has been deleted.
    #[error("application deleted")]
    ApplicationDeleted,

    /// Host ledger refused the transfers of the group.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl ContractError {
    /// Map the error into the failure taxonomy.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingMethodSelector
            | Self::UnknownMethod(_)
            | Self::InsufficientArguments { .. }
            | Self::MalformedArgument { .. }
            | Self::InvalidGroupSize { .. }
            | Self::InvalidGroupShape(_)
            | Self::ExpectedPayment(_)
            | Self::PaymentReceiverMismatch { .. }
            | Self::PaymentSenderMismatch { .. }
            | Self::ZeroPayment
            | Self::ZeroStake
            | Self::UpdateRejected => ErrorCategory::PreconditionFailure,
            Self::Unauthorized(_) => ErrorCategory::AuthorizationFailure,
            Self::NotOptedIn(_)
            | Self::AlreadyOptedIn(_)
            | Self::CommitmentActive(_)
            | Self::CommitmentNotActive { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::ApplicationDeleted => ErrorCategory::StateConflict,
            Self::ScoreOutOfRange(_) => ErrorCategory::RangeFailure,
            Self::RefundUnfunded { .. } | Self::CounterOverflow(_) => {
                ErrorCategory::ResourceExhaustion
            }
            Self::Ledger(err) => match err {
                LedgerError::InsufficientFunds { .. } | LedgerError::BalanceOverflow(_) => {
                    ErrorCategory::ResourceExhaustion
                }
                LedgerError::Unavailable(_) => ErrorCategory::PreconditionFailure,
            },
        }
    }
}
