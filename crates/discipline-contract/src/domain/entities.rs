//! # Domain Entities
//!
//! State records, operations and transitions of the discipline contract.

use super::errors::ContractError;
use super::value_objects::{Address, CommitmentStatus, Digest, OnCompletion};
use crate::events::ContractEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of operations in one atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

/// Application-wide record, created once at deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Operator account, fixed at creation.
    pub admin: Address,
    /// Commitments ever created.
    pub total_commitments: u64,
    /// Penalties ever applied.
    pub total_penalties: u64,
    /// Bridge intents ever recorded.
    pub total_bridge_intents: u64,
}

impl GlobalState {
    /// Initial record for a freshly created application.
    #[must_use]
    pub fn genesis(creator: Address) -> Self {
        Self {
            admin: creator,
            total_commitments: 0,
            total_penalties: 0,
            total_bridge_intents: 0,
        }
    }

    /// Authorization guard: caller equals the stored admin.
    #[must_use]
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.admin == *caller
    }
}

/// Per-account record, allocated at opt-in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Escrowed stake in the smallest currency unit.
    pub stake_amount: u64,
    /// Commitment lifecycle position.
    pub commitment_status: CommitmentStatus,
    /// Violations recorded against this account.
    pub violations: u64,
    /// Latest discipline score, 0-100.
    pub discipline_score: u64,
    /// Digest of the current commitment's metadata. Empty until first commitment.
    pub commitment_hash: Option<Digest>,
}

/// Funds transfer between two accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Debited account.
    pub sender: Address,
    /// Credited account.
    pub receiver: Address,
    /// Amount in the smallest currency unit.
    pub amount: u64,
}

/// Application call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCall {
    /// Calling account.
    pub sender: Address,
    /// Lifecycle action requested alongside the call.
    pub on_completion: OnCompletion,
    /// Raw positional arguments; argument 0 selects the method.
    pub args: Vec<Vec<u8>>,
}

/// Single member of an atomic group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Funds transfer.
    Payment(Payment),
    /// Application call.
    AppCall(AppCall),
}

impl Operation {
    /// Account that signed this operation.
    #[must_use]
    pub fn sender(&self) -> Address {
        match self {
            Self::Payment(p) => p.sender,
            Self::AppCall(c) => c.sender,
        }
    }
}

/// Ordered set of operations that commit or fail together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationGroup {
    operations: Vec<Operation>,
}

impl OperationGroup {
    /// Group from an explicit operation list.
    #[must_use]
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Lone application call.
    #[must_use]
    pub fn call(sender: Address, on_completion: OnCompletion, args: Vec<Vec<u8>>) -> Self {
        Self::new(vec![Operation::AppCall(AppCall {
            sender,
            on_completion,
            args,
        })])
    }

    /// Payment to `receiver` followed by a `NoOp` call from the same sender.
    #[must_use]
    pub fn funded_call(sender: Address, receiver: Address, amount: u64, args: Vec<Vec<u8>>) -> Self {
        Self::new(vec![
            Operation::Payment(Payment {
                sender,
                receiver,
                amount,
            }),
            Operation::AppCall(AppCall {
                sender,
                on_completion: OnCompletion::NoOp,
                args,
            }),
        ])
    }

    /// Members in submission order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Payment at `index`, if that member is a payment.
    #[must_use]
    pub fn payment(&self, index: usize) -> Option<&Payment> {
        match self.operations.get(index) {
            Some(Operation::Payment(p)) => Some(p),
            _ => None,
        }
    }

    /// Locate the single application call of the group.
    pub fn application_call(&self) -> Result<(usize, &AppCall), ContractError> {
        let mut calls = self
            .operations
            .iter()
            .enumerate()
            .filter_map(|(i, op)| match op {
                Operation::AppCall(call) => Some((i, call)),
                Operation::Payment(_) => None,
            });
        let first = calls.next().ok_or_else(|| {
            ContractError::InvalidGroupShape("group has no application call".to_string())
        })?;
        if calls.next().is_some() {
            return Err(ContractError::InvalidGroupShape(
                "group has more than one application call".to_string(),
            ));
        }
        Ok(first)
    }

    /// Iterate over payments of the group.
    pub fn payments(&self) -> impl Iterator<Item = &Payment> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Payment(p) => Some(p),
            Operation::AppCall(_) => None,
        })
    }
}

/// Environment the approval logic runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Application identifier.
    pub app_id: u64,
    /// Escrow account owned by the application.
    pub app_address: Address,
}

impl ExecutionContext {
    /// Context for an application id.
    #[must_use]
    pub fn new(app_id: u64) -> Self {
        Self {
            app_id,
            app_address: Address::for_application(app_id),
        }
    }
}

/// Outbound transfer the contract asks the host to perform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerTransfer {
    /// Credited account.
    pub receiver: Address,
    /// Amount in the smallest currency unit.
    pub amount: u64,
}

/// Pending change to one account record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountWrite {
    /// Store this record.
    Put(AccountState),
    /// Remove the record.
    Delete,
}

/// Result of evaluating one group: state delta plus declared effects.
///
/// Nothing in a transition is visible until the host commits it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    /// Global record after the call.
    pub global: GlobalState,
    /// Account records touched by the call.
    pub account_writes: BTreeMap<Address, AccountWrite>,
    /// Transfers the contract account must pay out.
    pub inner_transfers: Vec<InnerTransfer>,
    /// Events for the transaction log.
    pub events: Vec<ContractEvent>,
    /// Application is removed on commit.
    pub delete_application: bool,
}

impl Transition {
    /// Empty transition over the current global record.
    #[must_use]
    pub fn unchanged(global: GlobalState) -> Self {
        Self {
            global,
            account_writes: BTreeMap::new(),
            inner_transfers: Vec::new(),
            events: Vec::new(),
            delete_application: false,
        }
    }

    /// Total amount leaving the contract account.
    #[must_use]
    pub fn outbound_total(&self) -> u64 {
        self.inner_transfers
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.amount))
    }
}

/// Complete contract state held by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    /// Application-wide record.
    pub global: GlobalState,
    /// Opted-in accounts.
    pub accounts: BTreeMap<Address, AccountState>,
}

impl ContractState {
    /// State right after creation.
    #[must_use]
    pub fn create(creator: Address) -> Self {
        Self {
            global: GlobalState::genesis(creator),
            accounts: BTreeMap::new(),
        }
    }

    /// Local record of an account.
    #[must_use]
    pub fn account(&self, address: &Address) -> Option<&AccountState> {
        self.accounts.get(address)
    }

    /// Apply a transition in place.
    pub fn commit(&mut self, transition: &Transition) {
        self.global = transition.global.clone();
        for (address, write) in &transition.account_writes {
            match write {
                AccountWrite::Put(record) => {
                    self.accounts.insert(*address, record.clone());
                }
                AccountWrite::Delete => {
                    self.accounts.remove(address);
                }
            }
        }
    }
}
