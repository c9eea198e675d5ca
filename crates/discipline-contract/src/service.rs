//! # Discipline Contract Service
//!
//! Host that runs the approval program against live state.
//!
//! ## Commit Protocol
//!
//! Submissions are serialised. Each one goes through:
//!
//! 1. Evaluate the group against a snapshot (no side effects)
//! 2. Check the escrow can fund every outbound transfer
//! 3. Apply the group's payments and inner transfers as one ledger batch
//! 4. Commit the state delta and append to the transaction log
//!
//! A failure at any step leaves state, balances and log untouched.

use crate::adapters::BridgeIndex;
use crate::approval::ApprovalProgram;
use crate::domain::{
    AccountState, Address, ContractError, ContractState, ErrorCategory, ExecutionContext,
    GlobalState, Method, OnCompletion, OperationGroup, Transition,
};
use crate::events::ContractEvent;
use crate::ports::inbound::{DisciplineContractApi, Receipt};
use crate::ports::outbound::{EscrowLedger, TransactionLog, TransactionRecord, Transfer};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Discipline service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Application identifier; fixes the escrow address.
    pub app_id: u64,
    /// Balance the escrow account must keep after outbound transfers.
    pub min_escrow_balance: u64,
    /// Transaction log capacity for the in-memory log.
    pub max_log_entries: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_id: 1,
            min_escrow_balance: 0,
            max_log_entries: crate::adapters::DEFAULT_MAX_ENTRIES,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_id: env::var("DISCIPLINE_APP_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.app_id),
            min_escrow_balance: env::var("DISCIPLINE_MIN_ESCROW_BALANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_escrow_balance),
            max_log_entries: env::var("DISCIPLINE_MAX_LOG_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_log_entries),
        }
    }
}

/// Statistics for the discipline service.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Groups submitted.
    pub submitted: u64,
    /// Groups committed.
    pub accepted: u64,
    /// Groups rejected.
    pub rejected: u64,
    /// Rejections per failure category.
    pub rejections_by_category: BTreeMap<ErrorCategory, u64>,
    /// Total stake escrowed by commitments.
    pub total_staked: u64,
    /// Total paid back on successful verification.
    pub total_refunded: u64,
    /// Total kept on failed verification.
    pub total_forfeited: u64,
    /// Total deducted by penalties.
    pub total_penalized: u64,
}

impl ServiceStats {
    fn record_rejection(&mut self, category: ErrorCategory) {
        self.rejected += 1;
        *self.rejections_by_category.entry(category).or_insert(0) += 1;
    }

    fn record_events(&mut self, events: &[ContractEvent]) {
        self.accepted += 1;
        for event in events {
            match event {
                ContractEvent::CommitmentCreated { stake, .. } => {
                    self.total_staked = self.total_staked.saturating_add(*stake);
                }
                ContractEvent::SessionVerified {
                    refunded,
                    forfeited,
                    ..
                } => {
                    self.total_refunded = self.total_refunded.saturating_add(*refunded);
                    self.total_forfeited = self.total_forfeited.saturating_add(*forfeited);
                }
                ContractEvent::PenaltyApplied { penalty, .. } => {
                    self.total_penalized = self.total_penalized.saturating_add(*penalty);
                }
                _ => {}
            }
        }
    }
}

/// Live state plus the sequence counter. `state` is `None` once deleted.
#[derive(Debug)]
struct HostState {
    state: Option<ContractState>,
    next_tx_id: u64,
}

/// The discipline contract host.
pub struct DisciplineService<E: EscrowLedger, L: TransactionLog> {
    config: ServiceConfig,
    program: ApprovalProgram,
    escrow: Arc<E>,
    log: Arc<L>,
    host: RwLock<HostState>,
    stats: RwLock<ServiceStats>,
}

impl<E: EscrowLedger, L: TransactionLog> DisciplineService<E, L> {
    /// Deploy the application. `creator` becomes the admin.
    ///
    /// The creation is recorded as transaction 1.
    pub fn deploy(creator: Address, escrow: Arc<E>, log: Arc<L>, config: ServiceConfig) -> Self {
        let program = ApprovalProgram::new(ExecutionContext::new(config.app_id));
        let (state, event) = ApprovalProgram::on_create(creator);

        log.append(TransactionRecord {
            tx_id: 1,
            round: 1,
            sender: creator,
            on_completion: OnCompletion::NoOp,
            method: None,
            args: Vec::new(),
            payment_amount: None,
            inner_transfers: Vec::new(),
            events: vec![event],
        });
        info!(
            app_id = config.app_id,
            app_address = %program.context().app_address,
            admin = %creator,
            "Discipline contract deployed"
        );

        Self {
            config,
            program,
            escrow,
            log,
            host: RwLock::new(HostState {
                state: Some(state),
                next_tx_id: 2,
            }),
            stats: RwLock::new(ServiceStats::default()),
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Escrow ledger handle.
    pub fn escrow(&self) -> &Arc<E> {
        &self.escrow
    }

    /// Transaction log handle.
    pub fn log(&self) -> &Arc<L> {
        &self.log
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Copy of the full state, `None` once the application is deleted.
    pub async fn snapshot(&self) -> Option<ContractState> {
        self.host.read().await.state.clone()
    }

    /// Check if an account holds a local record.
    pub async fn is_opted_in(&self, account: &Address) -> Result<bool, ContractError> {
        Ok(self.account_state(account).await?.is_some())
    }

    /// Bridge requests correlated from the transaction log.
    pub fn bridge_index(&self) -> BridgeIndex {
        BridgeIndex::from_log(self.log.as_ref())
    }

    #[instrument(
        skip(self, group),
        fields(correlation_id = %Uuid::new_v4(), group_size = group.len())
    )]
    async fn execute(&self, group: &OperationGroup) -> Result<Receipt, ContractError> {
        let mut host = self.host.write().await;
        let state = host.state.as_ref().ok_or(ContractError::ApplicationDeleted)?;

        let transition = self.program.evaluate(state, group)?;
        self.ensure_refunds_funded(group, &transition).await?;

        let record = self.build_record(group, &transition, host.next_tx_id)?;

        let transfers = self.ledger_batch(group, &transition);
        if !transfers.is_empty() {
            self.escrow.transfer_batch(&transfers).await?;
            debug!(transfers = transfers.len(), "Ledger batch applied");
        }

        if transition.delete_application {
            host.state = None;
        } else if let Some(state) = host.state.as_mut() {
            state.commit(&transition);
        }
        host.next_tx_id += 1;

        let receipt = Receipt {
            tx_id: record.tx_id,
            round: record.round,
            events: record.events.clone(),
            inner_transfers: record.inner_transfers.clone(),
        };
        // Append under the lock so the log stays in tx_id order.
        self.log.append(record);
        drop(host);
        Ok(receipt)
    }

    /// Outbound transfers must leave at least `min_escrow_balance` behind,
    /// counting payments made to the escrow in the same group.
    async fn ensure_refunds_funded(
        &self,
        group: &OperationGroup,
        transition: &Transition,
    ) -> Result<(), ContractError> {
        let required = transition.outbound_total();
        if required == 0 {
            return Ok(());
        }

        let app_address = self.program.context().app_address;
        let balance = self.escrow.balance(&app_address).await?;
        let incoming = group
            .payments()
            .filter(|p| p.receiver == app_address)
            .fold(0u64, |acc, p| acc.saturating_add(p.amount));
        let spendable = balance
            .saturating_add(incoming)
            .saturating_sub(self.config.min_escrow_balance);

        if required > spendable {
            return Err(ContractError::RefundUnfunded {
                required,
                spendable,
            });
        }
        Ok(())
    }

    /// Group payments first, then the contract's own transfers.
    ///
    /// Only funded methods reach here with a payment, and the approval
    /// program has already bound it to the caller and the escrow account.
    fn ledger_batch(&self, group: &OperationGroup, transition: &Transition) -> Vec<Transfer> {
        let app_address = self.program.context().app_address;
        group
            .payments()
            .map(|p| Transfer {
                from: p.sender,
                to: p.receiver,
                amount: p.amount,
            })
            .chain(transition.inner_transfers.iter().map(|t| Transfer {
                from: app_address,
                to: t.receiver,
                amount: t.amount,
            }))
            .collect()
    }

    fn build_record(
        &self,
        group: &OperationGroup,
        transition: &Transition,
        tx_id: u64,
    ) -> Result<TransactionRecord, ContractError> {
        let (_, call) = group.application_call()?;
        let app_address = self.program.context().app_address;

        let (method, args) = match call.on_completion {
            OnCompletion::NoOp => (
                Method::decode(&call.args).ok().map(|m| m.name().to_string()),
                call.args.iter().skip(1).map(hex::encode).collect(),
            ),
            _ => (None, Vec::new()),
        };

        Ok(TransactionRecord {
            tx_id,
            round: tx_id,
            sender: call.sender,
            on_completion: call.on_completion,
            method,
            args,
            payment_amount: group
                .payments()
                .find(|p| p.receiver == app_address)
                .map(|p| p.amount),
            inner_transfers: transition.inner_transfers.clone(),
            events: transition.events.clone(),
        })
    }
}

#[async_trait]
impl<E: EscrowLedger, L: TransactionLog> DisciplineContractApi for DisciplineService<E, L> {
    async fn submit(&self, group: OperationGroup) -> Result<Receipt, ContractError> {
        self.stats.write().await.submitted += 1;

        match self.execute(&group).await {
            Ok(receipt) => {
                self.stats.write().await.record_events(&receipt.events);
                info!(
                    tx_id = receipt.tx_id,
                    events = ?receipt.events.iter().map(ContractEvent::name).collect::<Vec<_>>(),
                    "Group committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                let category = e.category();
                self.stats.write().await.record_rejection(category);
                warn!(error = %e, %category, "Group rejected");
                Err(e)
            }
        }
    }

    async fn global_state(&self) -> Result<GlobalState, ContractError> {
        self.host
            .read()
            .await
            .state
            .as_ref()
            .map(|s| s.global.clone())
            .ok_or(ContractError::ApplicationDeleted)
    }

    async fn account_state(&self, account: &Address) -> Result<Option<AccountState>, ContractError> {
        let host = self.host.read().await;
        let state = host.state.as_ref().ok_or(ContractError::ApplicationDeleted)?;
        Ok(state.account(account).cloned())
    }

    async fn escrow_balance(&self) -> Result<u64, ContractError> {
        Ok(self.escrow.balance(&self.program.context().app_address).await?)
    }

    fn app_id(&self) -> u64 {
        self.program.context().app_id
    }

    fn app_address(&self) -> Address {
        self.program.context().app_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryEscrow, InMemoryTransactionLog};
    use crate::domain::{CommitmentStatus, Digest};

    const ADMIN: Address = Address::new([1u8; 32]);
    const USER: Address = Address::new([2u8; 32]);

    type Service = DisciplineService<InMemoryEscrow, InMemoryTransactionLog>;

    fn deploy(config: ServiceConfig) -> Service {
        let escrow = Arc::new(InMemoryEscrow::with_balances([(USER, 10_000_000)]));
        DisciplineService::deploy(
            ADMIN,
            escrow,
            Arc::new(InMemoryTransactionLog::default()),
            config,
        )
    }

    async fn opt_in_and_stake(service: &Service, amount: u64) {
        service
            .submit(OperationGroup::call(USER, OnCompletion::OptIn, vec![]))
            .await
            .unwrap();
        let method = Method::CreateCommitment {
            commitment_hash: Digest::new([4u8; 32]),
            duration: 7,
        };
        service
            .submit(OperationGroup::funded_call(
                USER,
                service.app_address(),
                amount,
                method.encode(),
            ))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_deploy_records_creation() {
        let service = deploy(ServiceConfig::default());
        let global = service.global_state().await.unwrap();
        assert_eq!(global.admin, ADMIN);
        assert_eq!(service.log().len(), 1);
        assert_eq!(
            service.log().records()[0].events,
            vec![ContractEvent::ApplicationCreated { admin: ADMIN }]
        );
    }

    #[tokio::test]
    async fn test_stake_moves_funds_into_escrow() {
        let service = deploy(ServiceConfig::default());
        opt_in_and_stake(&service, 1_000_000).await;

        assert_eq!(service.escrow_balance().await.unwrap(), 1_000_000);
        assert_eq!(service.escrow().balance_of(&USER), 9_000_000);
        let record = service.account_state(&USER).await.unwrap().unwrap();
        assert_eq!(record.commitment_status, CommitmentStatus::Active);
    }

    #[tokio::test]
    async fn test_refund_respects_reserve() {
        let service = deploy(ServiceConfig {
            min_escrow_balance: 100,
            ..ServiceConfig::default()
        });
        opt_in_and_stake(&service, 500).await;

        let verify = Method::VerifySession {
            account: USER,
            success: true,
        };
        let err = service
            .submit(OperationGroup::call(ADMIN, OnCompletion::NoOp, verify.encode()))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::RefundUnfunded {
                required: 500,
                spendable: 400
            }
        );

        let record = service.account_state(&USER).await.unwrap().unwrap();
        assert_eq!(record.stake_amount, 500);
        assert_eq!(record.commitment_status, CommitmentStatus::Active);
        assert_eq!(service.escrow_balance().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_rejection_leaves_no_log_entry() {
        let service = deploy(ServiceConfig::default());
        let before = service.log().len();
        let result = service
            .submit(OperationGroup::call(USER, OnCompletion::CloseOut, vec![]))
            .await;
        assert_eq!(result, Err(ContractError::NotOptedIn(USER)));
        assert_eq!(service.log().len(), before);
    }

    #[tokio::test]
    async fn test_ledger_outage_rejects_group() {
        let service = deploy(ServiceConfig::default());
        service
            .submit(OperationGroup::call(USER, OnCompletion::OptIn, vec![]))
            .await
            .unwrap();
        service.escrow().set_unavailable(true);

        let method = Method::CreateCommitment {
            commitment_hash: Digest::new([4u8; 32]),
            duration: 0,
        };
        let result = service
            .submit(OperationGroup::funded_call(
                USER,
                service.app_address(),
                100,
                method.encode(),
            ))
            .await;
        assert!(matches!(result, Err(ContractError::Ledger(_))));

        service.escrow().set_unavailable(false);
        let record = service.account_state(&USER).await.unwrap().unwrap();
        assert_eq!(record.commitment_status, CommitmentStatus::None);
        assert_eq!(service.global_state().await.unwrap().total_commitments, 0);
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let service = deploy(ServiceConfig::default());
        opt_in_and_stake(&service, 1_000).await;

        let verify = Method::VerifySession {
            account: USER,
            success: false,
        };
        service
            .submit(OperationGroup::call(ADMIN, OnCompletion::NoOp, verify.encode()))
            .await
            .unwrap();
        let _ = service
            .submit(OperationGroup::call(USER, OnCompletion::NoOp, verify.encode()))
            .await;

        let stats = service.stats().await;
        assert_eq!(stats.submitted, 4);
        assert_eq!(stats.accepted, 3);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.total_staked, 1_000);
        assert_eq!(stats.total_forfeited, 1_000);
        assert_eq!(
            stats.rejections_by_category[&ErrorCategory::AuthorizationFailure],
            1
        );
    }

    #[tokio::test]
    async fn test_deleted_application_rejects_everything() {
        let service = deploy(ServiceConfig::default());
        service
            .submit(OperationGroup::call(
                ADMIN,
                OnCompletion::DeleteApplication,
                vec![],
            ))
            .await
            .unwrap();

        assert_eq!(
            service.global_state().await,
            Err(ContractError::ApplicationDeleted)
        );
        let result = service
            .submit(OperationGroup::call(USER, OnCompletion::OptIn, vec![]))
            .await;
        assert_eq!(result, Err(ContractError::ApplicationDeleted));
        assert!(service.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_record_hex_encodes_arguments() {
        let service = deploy(ServiceConfig::default());
        opt_in_and_stake(&service, 42).await;

        let record = service.log().records().pop().unwrap();
        assert_eq!(record.method.as_deref(), Some(Method::CREATE_COMMITMENT));
        assert_eq!(record.args[0], hex::encode([4u8; 32]));
        assert_eq!(record.payment_amount, Some(42));
        assert_eq!(record.tx_id, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_log_order_under_concurrent_submits() {
        let service = Arc::new(deploy(ServiceConfig::default()));

        let mut handles = Vec::new();
        for i in 0..200u16 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let mut bytes = [0x40u8; 32];
                bytes[..2].copy_from_slice(&i.to_be_bytes());
                service
                    .submit(OperationGroup::call(
                        Address::new(bytes),
                        OnCompletion::OptIn,
                        vec![],
                    ))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let ids: Vec<u64> = service.log().records().iter().map(|r| r.tx_id).collect();
        assert_eq!(ids.len(), 201);
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "log out of order");
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.min_escrow_balance, 0);
        assert_eq!(config.max_log_entries, 10_000);
    }

    #[test]
    fn test_config_from_env() {
        const VARS: [&str; 3] = [
            "DISCIPLINE_APP_ID",
            "DISCIPLINE_MIN_ESCROW_BALANCE",
            "DISCIPLINE_MAX_LOG_ENTRIES",
        ];
        let saved: Vec<_> = VARS.iter().map(|k| (*k, env::var(k).ok())).collect();

        env::set_var("DISCIPLINE_APP_ID", "4242");
        env::set_var("DISCIPLINE_MIN_ESCROW_BALANCE", "100000");
        env::set_var("DISCIPLINE_MAX_LOG_ENTRIES", "lots");
        let config = ServiceConfig::from_env();

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        assert_eq!(config.app_id, 4242);
        assert_eq!(config.min_escrow_balance, 100_000);
        assert_eq!(config.max_log_entries, ServiceConfig::default().max_log_entries);
    }
}
