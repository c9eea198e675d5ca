//! # Outbound Ports
//!
//! What the contract host depends on: a ledger that moves funds and a
//! durable log of accepted transactions.

use crate::domain::{Address, InnerTransfer, LedgerError, OnCompletion};
use crate::events::ContractEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Funds movement between two ledger accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Debited account.
    pub from: Address,
    /// Credited account.
    pub to: Address,
    /// Amount in the smallest currency unit.
    pub amount: u64,
}

/// Host ledger holding account balances - outbound port.
#[async_trait]
pub trait EscrowLedger: Send + Sync {
    /// Current balance of an account.
    async fn balance(&self, account: &Address) -> Result<u64, LedgerError>;

    /// Apply transfers in order, all or nothing.
    ///
    /// If any transfer fails no balance changes.
    async fn transfer_batch(&self, transfers: &[Transfer]) -> Result<(), LedgerError>;
}

/// Accepted transaction as seen by an indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Sequential transaction id.
    pub tx_id: u64,
    /// Round the group was committed in.
    pub round: u64,
    /// Application call sender.
    pub sender: Address,
    /// Lifecycle action of the call.
    pub on_completion: OnCompletion,
    /// Selected method for `NoOp` calls.
    pub method: Option<String>,
    /// Hex-encoded arguments after the selector.
    pub args: Vec<String>,
    /// Amount of the grouped funding payment, if any.
    pub payment_amount: Option<u64>,
    /// Transfers paid out by the contract.
    pub inner_transfers: Vec<InnerTransfer>,
    /// Events emitted by the call.
    pub events: Vec<ContractEvent>,
}

/// Durable record of accepted transactions - outbound port.
pub trait TransactionLog: Send + Sync {
    /// Append an accepted transaction.
    fn append(&self, record: TransactionRecord);

    /// Records with `tx_id` greater than `after`, oldest first.
    fn records_since(&self, after: Option<u64>) -> Vec<TransactionRecord>;

    /// All retained records, oldest first.
    fn records(&self) -> Vec<TransactionRecord> {
        self.records_since(None)
    }
}
