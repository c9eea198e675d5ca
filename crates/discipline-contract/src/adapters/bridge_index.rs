//! Bridge Correlation Index
//!
//! Read model over the transaction log pairing bridge intents with the
//! operator's settlements. The contract keeps no intent state, so this is
//! the only place the two phases meet.
//!
//! Settlements are matched to the oldest pending intent of the same
//! account. Settlements with nothing left to match are kept apart, since
//! the contract accepts repeated settlements.

use crate::domain::{Address, Digest};
use crate::events::ContractEvent;
use crate::ports::outbound::{TransactionLog, TransactionRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Intent as read from the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeIntentEntry {
    /// Transaction id of the intent.
    pub tx_id: u64,
    /// Round of the intent.
    pub round: u64,
    /// Requesting account.
    pub account: Address,
    /// Hashed payout reference.
    pub reference: Digest,
    /// Amount escrowed with the request.
    pub amount: u64,
}

/// Settlement as read from the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSettlementEntry {
    /// Transaction id of the settlement.
    pub tx_id: u64,
    /// Round of the settlement.
    pub round: u64,
    /// Account paid out.
    pub account: Address,
    /// Hashed settlement reference.
    pub reference: Digest,
}

/// An intent and, once settled, its settlement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// The request.
    pub intent: BridgeIntentEntry,
    /// The attestation, if any.
    pub settlement: Option<BridgeSettlementEntry>,
}

impl BridgeRequest {
    /// Check if the payout was attested.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.settlement.is_some()
    }
}

/// Correlated view of all bridge activity in a log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeIndex {
    requests: Vec<BridgeRequest>,
    unmatched_settlements: Vec<BridgeSettlementEntry>,
}

impl BridgeIndex {
    /// Build the index from a transaction log.
    pub fn from_log(log: &dyn TransactionLog) -> Self {
        Self::from_records(&log.records())
    }

    /// Build the index from records in log order.
    #[must_use]
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        let mut index = Self::default();
        let mut pending: BTreeMap<Address, VecDeque<usize>> = BTreeMap::new();

        for record in records {
            for event in &record.events {
                match event {
                    ContractEvent::BridgeIntentRecorded {
                        account,
                        reference,
                        amount,
                    } => {
                        pending
                            .entry(*account)
                            .or_default()
                            .push_back(index.requests.len());
                        index.requests.push(BridgeRequest {
                            intent: BridgeIntentEntry {
                                tx_id: record.tx_id,
                                round: record.round,
                                account: *account,
                                reference: *reference,
                                amount: *amount,
                            },
                            settlement: None,
                        });
                    }
                    ContractEvent::BridgeSettled { account, reference } => {
                        let entry = BridgeSettlementEntry {
                            tx_id: record.tx_id,
                            round: record.round,
                            account: *account,
                            reference: *reference,
                        };
                        match pending.get_mut(account).and_then(VecDeque::pop_front) {
                            Some(slot) => index.requests[slot].settlement = Some(entry),
                            None => index.unmatched_settlements.push(entry),
                        }
                    }
                    _ => {}
                }
            }
        }
        index
    }

    /// All requests in log order.
    #[must_use]
    pub fn requests(&self) -> &[BridgeRequest] {
        &self.requests
    }

    /// Requests still awaiting a settlement.
    pub fn pending(&self) -> impl Iterator<Item = &BridgeRequest> {
        self.requests.iter().filter(|r| !r.is_settled())
    }

    /// Requests of one account.
    pub fn for_account<'a>(&'a self, account: &'a Address) -> impl Iterator<Item = &'a BridgeRequest> {
        self.requests
            .iter()
            .filter(move |r| r.intent.account == *account)
    }

    /// Settlements that found no pending intent.
    #[must_use]
    pub fn unmatched_settlements(&self) -> &[BridgeSettlementEntry] {
        &self.unmatched_settlements
    }

    /// Total amount of requests still awaiting payout.
    #[must_use]
    pub fn pending_amount(&self) -> u64 {
        self.pending()
            .fold(0u64, |acc, r| acc.saturating_add(r.intent.amount))
    }
}
