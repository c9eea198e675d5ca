//! In-Memory Escrow Ledger
//!
//! Implements `EscrowLedger` over a balance map.

use crate::domain::{Address, LedgerError};
use crate::ports::outbound::{EscrowLedger, Transfer};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// In-memory ledger for tests and local replay.
#[derive(Debug, Default)]
pub struct InMemoryEscrow {
    balances: RwLock<HashMap<Address, u64>>,
    unavailable: AtomicBool,
}

impl InMemoryEscrow {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with balances.
    #[must_use]
    pub fn with_balances(balances: impl IntoIterator<Item = (Address, u64)>) -> Self {
        Self {
            balances: RwLock::new(balances.into_iter().collect()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Credit an account outside of any group.
    pub fn fund(&self, account: Address, amount: u64) {
        let mut balances = self.balances.write();
        let entry = balances.entry(account).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Balance without going through the async port.
    #[must_use]
    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    /// Simulate an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("escrow ledger offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl EscrowLedger for InMemoryEscrow {
    async fn balance(&self, account: &Address) -> Result<u64, LedgerError> {
        self.check_available()?;
        Ok(self.balance_of(account))
    }

    async fn transfer_batch(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        self.check_available()?;

        let mut balances = self.balances.write();
        let mut working = balances.clone();

        for transfer in transfers {
            let available = working.get(&transfer.from).copied().unwrap_or(0);
            let debited =
                available
                    .checked_sub(transfer.amount)
                    .ok_or(LedgerError::InsufficientFunds {
                        account: transfer.from,
                        required: transfer.amount,
                        available,
                    })?;
            working.insert(transfer.from, debited);

            let credited = working
                .get(&transfer.to)
                .copied()
                .unwrap_or(0)
                .checked_add(transfer.amount)
                .ok_or(LedgerError::BalanceOverflow(transfer.to))?;
            working.insert(transfer.to, credited);

            debug!(
                from = %transfer.from,
                to = %transfer.to,
                amount = transfer.amount,
                "Transfer staged"
            );
        }

        *balances = working;
        Ok(())
    }
}
