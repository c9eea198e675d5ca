//! In-Memory Transaction Log
//!
//! Implements `TransactionLog` as a bounded append-only queue.

use crate::ports::outbound::{TransactionLog, TransactionRecord};
use parking_lot::RwLock;
use std::collections::VecDeque;

/// Default number of retained records.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Bounded in-memory transaction log. Oldest records are evicted first.
#[derive(Debug)]
pub struct InMemoryTransactionLog {
    records: RwLock<VecDeque<TransactionRecord>>,
    max_entries: usize,
}

impl InMemoryTransactionLog {
    /// Log retaining at most `max_entries` records.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for InMemoryTransactionLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl TransactionLog for InMemoryTransactionLog {
    fn append(&self, record: TransactionRecord) {
        let mut records = self.records.write();
        if records.len() == self.max_entries {
            records.pop_front();
        }
        records.push_back(record);
    }

    fn records_since(&self, after: Option<u64>) -> Vec<TransactionRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| after.map_or(true, |cursor| r.tx_id > cursor))
            .cloned()
            .collect()
    }
}
