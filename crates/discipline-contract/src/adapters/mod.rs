//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, plus the bridge
//! correlation read model built on top of the transaction log.

mod bridge_index;
mod escrow;
mod transaction_log;

pub use bridge_index::{BridgeIndex, BridgeIntentEntry, BridgeRequest, BridgeSettlementEntry};
pub use escrow::InMemoryEscrow;
pub use transaction_log::{InMemoryTransactionLog, DEFAULT_MAX_ENTRIES};
