//! # Inbound Ports
//!
//! API trait defining what the discipline contract host can do.

use crate::domain::{AccountState, Address, ContractError, GlobalState, InnerTransfer, OperationGroup};
use crate::events::ContractEvent;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Confirmation of an accepted group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Transaction id in the log.
    pub tx_id: u64,
    /// Round the group was committed in.
    pub round: u64,
    /// Events emitted.
    pub events: Vec<ContractEvent>,
    /// Transfers paid out by the contract.
    pub inner_transfers: Vec<InnerTransfer>,
}

/// Discipline contract API - inbound port.
#[async_trait]
pub trait DisciplineContractApi: Send + Sync {
    /// Submit an atomic group. Either every member commits or none does.
    async fn submit(&self, group: OperationGroup) -> Result<Receipt, ContractError>;

    /// Application-wide record.
    async fn global_state(&self) -> Result<GlobalState, ContractError>;

    /// Local record of an account, `None` if not opted in.
    async fn account_state(&self, account: &Address) -> Result<Option<AccountState>, ContractError>;

    /// Balance of the application account.
    async fn escrow_balance(&self) -> Result<u64, ContractError>;

    /// Application identifier.
    fn app_id(&self) -> u64;

    /// Application escrow account.
    fn app_address(&self) -> Address;
}
