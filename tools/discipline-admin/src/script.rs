//! Replay script format.
//!
//! A script seeds ledger balances, deploys the contract and lists the
//! groups to submit, one step per group.
//!
//! ```json
//! {
//!   "admin": "a1a1...",
//!   "balances": { "b2b2...": 5000000 },
//!   "steps": [
//!     { "action": "opt_in", "sender": "b2b2..." },
//!     { "action": "create_commitment", "sender": "b2b2...",
//!       "commitment_hash": "5e5e...", "duration": 30, "stake": 1000000 }
//!   ]
//! }
//! ```

use discipline_contract::{Address, Digest, Method, OnCompletion, OperationGroup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete replay script.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Creator and admin of the application.
    pub admin: Address,
    /// Application id; defaults to the service configuration.
    #[serde(default)]
    pub app_id: Option<u64>,
    /// Escrow reserve; defaults to the service configuration.
    #[serde(default)]
    pub min_escrow_balance: Option<u64>,
    /// Ledger balances before deployment.
    #[serde(default)]
    pub balances: BTreeMap<Address, u64>,
    /// Steps in submission order.
    pub steps: Vec<Step>,
}

impl Script {
    /// Parse a script from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// One scripted action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Allocate the sender's record.
    OptIn {
        /// Caller.
        sender: Address,
    },
    /// Release the sender's record.
    CloseOut {
        /// Caller.
        sender: Address,
    },
    /// Drop the sender's record unconditionally.
    ClearState {
        /// Caller.
        sender: Address,
    },
    /// Stake with a funding payment.
    CreateCommitment {
        /// Caller and payer.
        sender: Address,
        /// Commitment digest.
        commitment_hash: Digest,
        /// Declared duration.
        #[serde(default)]
        duration: u64,
        /// Payment amount.
        stake: u64,
    },
    /// Resolve a commitment.
    VerifySession {
        /// Caller.
        sender: Address,
        /// Target account.
        account: Address,
        /// Outcome.
        success: bool,
    },
    /// Deduct a penalty.
    ApplyPenalty {
        /// Caller.
        sender: Address,
        /// Target account.
        account: Address,
    },
    /// Record a score.
    LogDiscipline {
        /// Caller.
        sender: Address,
        /// Target account.
        account: Address,
        /// Score.
        score: u64,
    },
    /// Request a fiat payout with a funding payment.
    BridgeIntent {
        /// Caller and payer.
        sender: Address,
        /// Payout reference digest.
        reference: Digest,
        /// Payment amount.
        amount: u64,
    },
    /// Attest a payout.
    SettleBridge {
        /// Caller.
        sender: Address,
        /// Account paid out.
        account: Address,
        /// Settlement reference digest.
        reference: Digest,
    },
    /// Attempt an application update.
    Update {
        /// Caller.
        sender: Address,
    },
    /// Delete the application.
    Delete {
        /// Caller.
        sender: Address,
    },
    /// Credit an account outside any group.
    Fund {
        /// Credited account.
        account: Address,
        /// Amount.
        amount: u64,
    },
}

impl Step {
    /// Action name as written in scripts.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OptIn { .. } => "opt_in",
            Self::CloseOut { .. } => "close_out",
            Self::ClearState { .. } => "clear_state",
            Self::CreateCommitment { .. } => "create_commitment",
            Self::VerifySession { .. } => "verify_session",
            Self::ApplyPenalty { .. } => "apply_penalty",
            Self::LogDiscipline { .. } => "log_discipline",
            Self::BridgeIntent { .. } => "bridge_intent",
            Self::SettleBridge { .. } => "settle_bridge",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Fund { .. } => "fund",
        }
    }

    /// Build the group to submit. `None` for steps that bypass the contract.
    #[must_use]
    pub fn to_group(&self, app_address: Address) -> Option<OperationGroup> {
        let call = |sender: Address, method: Method| {
            OperationGroup::call(sender, OnCompletion::NoOp, method.encode())
        };

        let group = match self {
            Self::OptIn { sender } => OperationGroup::call(*sender, OnCompletion::OptIn, vec![]),
            Self::CloseOut { sender } => {
                OperationGroup::call(*sender, OnCompletion::CloseOut, vec![])
            }
            Self::ClearState { sender } => {
                OperationGroup::call(*sender, OnCompletion::ClearState, vec![])
            }
            Self::CreateCommitment {
                sender,
                commitment_hash,
                duration,
                stake,
            } => OperationGroup::funded_call(
                *sender,
                app_address,
                *stake,
                Method::CreateCommitment {
                    commitment_hash: *commitment_hash,
                    duration: *duration,
                }
                .encode(),
            ),
            Self::VerifySession {
                sender,
                account,
                success,
            } => call(
                *sender,
                Method::VerifySession {
                    account: *account,
                    success: *success,
                },
            ),
            Self::ApplyPenalty { sender, account } => {
                call(*sender, Method::ApplyPenalty { account: *account })
            }
            Self::LogDiscipline {
                sender,
                account,
                score,
            } => call(
                *sender,
                Method::LogDiscipline {
                    account: *account,
                    score: *score,
                },
            ),
            Self::BridgeIntent {
                sender,
                reference,
                amount,
            } => OperationGroup::funded_call(
                *sender,
                app_address,
                *amount,
                Method::BridgeIntent {
                    reference: *reference,
                }
                .encode(),
            ),
            Self::SettleBridge {
                sender,
                account,
                reference,
            } => call(
                *sender,
                Method::SettleBridge {
                    account: *account,
                    reference: *reference,
                },
            ),
            Self::Update { sender } => {
                OperationGroup::call(*sender, OnCompletion::UpdateApplication, vec![])
            }
            Self::Delete { sender } => {
                OperationGroup::call(*sender, OnCompletion::DeleteApplication, vec![])
            }
            Self::Fund { .. } => return None,
        };
        Some(group)
    }
}
