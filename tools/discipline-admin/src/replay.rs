//! Scripted replay against an in-memory deployment.

use crate::script::{Script, Step};
use discipline_contract::{
    BridgeRequest, ContractError, ContractEvent, ContractState, DisciplineContractApi,
    DisciplineService, ErrorCategory, InMemoryEscrow, InMemoryTransactionLog, ServiceConfig,
    ServiceStats, TransactionLog, TransactionRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Replay failures.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A step was rejected while replaying in fail-fast mode.
    #[error("step {index} ({action}) rejected: {source}")]
    Rejected {
        /// Step position.
        index: usize,
        /// Step action name.
        action: &'static str,
        /// Contract error.
        source: ContractError,
    },

    /// Querying the deployment failed after the steps ran.
    #[error("failed to read final state: {0}")]
    Query(ContractError),
}

/// What happened to one step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Group committed.
    Accepted {
        /// Transaction id.
        tx_id: u64,
        /// Events emitted.
        events: Vec<ContractEvent>,
    },
    /// Group rejected with no effect.
    Rejected {
        /// Error message.
        error: String,
        /// Failure category.
        category: ErrorCategory,
    },
    /// Balance credited outside the contract.
    Funded,
}

/// Result of one step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step position.
    pub index: usize,
    /// Step action name.
    pub action: String,
    /// Outcome.
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Full replay output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Application escrow account.
    pub app_address: discipline_contract::Address,
    /// Per-step outcomes.
    pub steps: Vec<StepReport>,
    /// Final state, absent if the application was deleted.
    pub final_state: Option<ContractState>,
    /// Final escrow balance.
    pub escrow_balance: u64,
    /// Host statistics.
    pub stats: ServiceStats,
    /// Correlated bridge requests.
    pub bridge_requests: Vec<BridgeRequest>,
    /// Transaction log, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<Vec<TransactionRecord>>,
}

/// Replay options.
#[derive(Clone, Debug, Default)]
pub struct ReplayOptions {
    /// Stop at the first rejected step.
    pub fail_fast: bool,
    /// Include the transaction log in the report.
    pub include_log: bool,
}

/// Deploy a fresh contract and run every step of the script.
pub async fn replay(
    script: &Script,
    base: ServiceConfig,
    options: &ReplayOptions,
) -> Result<ReplayReport, ReplayError> {
    let config = ServiceConfig {
        app_id: script.app_id.unwrap_or(base.app_id),
        min_escrow_balance: script.min_escrow_balance.unwrap_or(base.min_escrow_balance),
        ..base
    };
    let escrow = Arc::new(InMemoryEscrow::with_balances(
        script.balances.iter().map(|(a, b)| (*a, *b)),
    ));
    let log = Arc::new(InMemoryTransactionLog::new(config.max_log_entries));
    let service = DisciplineService::deploy(script.admin, Arc::clone(&escrow), log, config);
    let app_address = service.app_address();

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let outcome = match step.to_group(app_address) {
            None => {
                if let Step::Fund { account, amount } = step {
                    escrow.fund(*account, *amount);
                }
                StepOutcome::Funded
            }
            Some(group) => match service.submit(group).await {
                Ok(receipt) => StepOutcome::Accepted {
                    tx_id: receipt.tx_id,
                    events: receipt.events,
                },
                Err(source) if options.fail_fast => {
                    return Err(ReplayError::Rejected {
                        index,
                        action: step.name(),
                        source,
                    });
                }
                Err(e) => {
                    warn!(index, action = step.name(), error = %e, "Step rejected");
                    StepOutcome::Rejected {
                        error: e.to_string(),
                        category: e.category(),
                    }
                }
            },
        };
        steps.push(StepReport {
            index,
            action: step.name().to_string(),
            outcome,
        });
    }

    let escrow_balance = service.escrow_balance().await.map_err(ReplayError::Query)?;
    let report = ReplayReport {
        app_address,
        steps,
        final_state: service.snapshot().await,
        escrow_balance,
        stats: service.stats().await,
        bridge_requests: service.bridge_index().requests().to_vec(),
        log: options.include_log.then(|| service.log().records()),
    };
    info!(
        steps = report.steps.len(),
        accepted = report.stats.accepted,
        rejected = report.stats.rejected,
        "Replay finished"
    );
    Ok(report)
}
