//! # Discipline Contract
//!
//! On-ledger accountability escrow for a habit-tracking product.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Users stake funds against a commitment. An operator (the admin) later
//! verifies the outcome: success refunds the stake, failure forfeits it to
//! the contract. Along the way the operator can deduct penalties and record
//! a discipline score. A two-phase bridge lets users request a fiat payout
//! that the operator attests once paid off-ledger.
//!
//! ## Atomicity
//!
//! | Step | Effect on failure |
//! |------|-------------------|
//! | Evaluate group | nothing written |
//! | Refund funding check | nothing written |
//! | Ledger batch | no balance moves |
//! | Commit + log | only reached when all of the above passed |
//!
//! ## Module Structure
//!
//! ```text
//! discipline-contract/
//! ├── domain/          # State records, operation groups, errors, invariants
//! ├── algorithms/      # Commitment lifecycle, penalties, scores, bridge
//! ├── approval/        # Method router and group validation
//! ├── ports/           # DisciplineContractApi, EscrowLedger, TransactionLog
//! ├── adapters/        # In-memory ledger and log, bridge index
//! ├── events.rs        # Emitted facts
//! ├── metadata.rs      # Schema and method descriptor
//! └── service.rs       # Host with the commit protocol
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod approval;
pub mod domain;
pub mod events;
pub mod metadata;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{BridgeIndex, BridgeRequest, InMemoryEscrow, InMemoryTransactionLog};
pub use algorithms::{calculate_penalty, PENALTY_DIVISOR};
pub use approval::ApprovalProgram;
pub use domain::{
    AccountState, Address, CommitmentStatus, ContractError, ContractState, Digest,
    ErrorCategory, ExecutionContext, GlobalState, LedgerError, Method, OnCompletion,
    Operation, OperationGroup, Payment, MAX_DISCIPLINE_SCORE, MAX_GROUP_SIZE,
};
pub use events::ContractEvent;
pub use metadata::ContractMetadata;
pub use ports::{
    DisciplineContractApi, EscrowLedger, Receipt, TransactionLog, TransactionRecord, Transfer,
};
pub use service::{DisciplineService, ServiceConfig, ServiceStats};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
