//! # Approval Program
//!
//! Method router and lifecycle handlers. [`ApprovalProgram::evaluate`] is a
//! pure function of the current state and the submitted group: it returns a
//! [`Transition`] describing the new records and the outbound transfers the
//! host must perform, or an error that rejects the whole group.
//!
//! ## Routing
//!
//! | On-completion | Handler |
//! |---------------|---------|
//! | `NoOp` | method selected by argument 0 |
//! | `OptIn` | allocate empty record |
//! | `CloseOut` | release record unless a commitment is active |
//! | `ClearState` | release record unconditionally |
//! | `UpdateApplication` | always rejected |
//! | `DeleteApplication` | admin only |

pub mod validation;

use crate::algorithms::{
    apply_penalty, create_commitment, log_discipline, record_bridge_intent, verify_session,
    SessionOutcome,
};
use crate::domain::{
    invariant_closeout_allowed, AccountState, AccountWrite, Address, AppCall, ContractError,
    ContractState, Digest, ExecutionContext, InnerTransfer, Method, OnCompletion,
    OperationGroup, Transition, MAX_GROUP_SIZE,
};
use crate::events::ContractEvent;
use validation::{authorize, opted_in, require_lone_call, validate_funding_group};

/// The contract's approval logic bound to one application.
#[derive(Clone, Copy, Debug)]
pub struct ApprovalProgram {
    ctx: ExecutionContext,
}

impl ApprovalProgram {
    /// Program for the given execution context.
    #[must_use]
    pub fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Execution context.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    /// Create handler: the creator becomes admin and all counters start at zero.
    #[must_use]
    pub fn on_create(creator: Address) -> (ContractState, ContractEvent) {
        (
            ContractState::create(creator),
            ContractEvent::ApplicationCreated { admin: creator },
        )
    }

    /// Evaluate a group against the current state.
    pub fn evaluate(
        &self,
        state: &ContractState,
        group: &OperationGroup,
    ) -> Result<Transition, ContractError> {
        if group.is_empty() {
            return Err(ContractError::InvalidGroupShape("empty group".to_string()));
        }
        if group.len() > MAX_GROUP_SIZE {
            return Err(ContractError::InvalidGroupSize {
                expected: MAX_GROUP_SIZE,
                got: group.len(),
            });
        }

        let (call_index, call) = group.application_call()?;
        if call.on_completion != OnCompletion::NoOp {
            require_lone_call(group)?;
        }
        match call.on_completion {
            OnCompletion::NoOp => self.dispatch(state, group, call_index, call),
            OnCompletion::OptIn => Self::opt_in(state, &call.sender),
            OnCompletion::CloseOut => Self::close_out(state, &call.sender),
            OnCompletion::ClearState => Self::clear_state(state, &call.sender),
            OnCompletion::UpdateApplication => Err(ContractError::UpdateRejected),
            OnCompletion::DeleteApplication => Self::delete(state, &call.sender),
        }
    }

    fn dispatch(
        &self,
        state: &ContractState,
        group: &OperationGroup,
        call_index: usize,
        call: &AppCall,
    ) -> Result<Transition, ContractError> {
        let caller = call.sender;
        let method = Method::decode(&call.args)?;
        if !method.requires_payment() {
            require_lone_call(group)?;
        }
        match method {
            Method::CreateCommitment {
                commitment_hash,
                duration,
            } => {
                let payment = validate_funding_group(group, call_index, &caller, &self.ctx)?;
                let mut record = opted_in(state, &caller)?;
                let mut transition = Transition::unchanged(state.global.clone());

                create_commitment(
                    &mut transition.global,
                    &caller,
                    &mut record,
                    commitment_hash,
                    payment.amount,
                )?;

                transition.events.push(ContractEvent::CommitmentCreated {
                    account: caller,
                    commitment_hash,
                    stake: payment.amount,
                    duration,
                });
                transition
                    .account_writes
                    .insert(caller, AccountWrite::Put(record));
                Ok(transition)
            }
            Method::VerifySession { account, success } => {
                authorize(state, &caller)?;
                let mut record = opted_in(state, &account)?;
                let mut transition = Transition::unchanged(state.global.clone());

                let (refunded, forfeited) = match verify_session(&account, &mut record, success)? {
                    SessionOutcome::Completed { refund } => {
                        transition.inner_transfers.push(InnerTransfer {
                            receiver: account,
                            amount: refund,
                        });
                        (refund, 0)
                    }
                    SessionOutcome::Failed { forfeited } => (0, forfeited),
                };

                transition.events.push(ContractEvent::SessionVerified {
                    account,
                    success,
                    refunded,
                    forfeited,
                });
                transition
                    .account_writes
                    .insert(account, AccountWrite::Put(record));
                Ok(transition)
            }
            Method::ApplyPenalty { account } => {
                authorize(state, &caller)?;
                let mut record = opted_in(state, &account)?;
                let mut transition = Transition::unchanged(state.global.clone());

                let outcome = apply_penalty(&mut transition.global, &account, &mut record)?;

                transition.events.push(ContractEvent::PenaltyApplied {
                    account,
                    penalty: outcome.penalty,
                    remaining_stake: outcome.remaining_stake,
                    violations: outcome.violations,
                });
                transition
                    .account_writes
                    .insert(account, AccountWrite::Put(record));
                Ok(transition)
            }
            Method::LogDiscipline { account, score } => {
                authorize(state, &caller)?;
                let mut record = opted_in(state, &account)?;
                log_discipline(&mut record, score)?;

                let mut transition = Transition::unchanged(state.global.clone());
                transition
                    .events
                    .push(ContractEvent::DisciplineLogged { account, score });
                transition
                    .account_writes
                    .insert(account, AccountWrite::Put(record));
                Ok(transition)
            }
            Method::BridgeIntent { reference } => {
                let payment = validate_funding_group(group, call_index, &caller, &self.ctx)?;
                opted_in(state, &caller)?;
                let mut transition = Transition::unchanged(state.global.clone());

                record_bridge_intent(&mut transition.global)?;

                transition.events.push(ContractEvent::BridgeIntentRecorded {
                    account: caller,
                    reference,
                    amount: payment.amount,
                });
                Ok(transition)
            }
            Method::SettleBridge { account, reference } => {
                authorize(state, &caller)?;
                Ok(Self::settlement(state, account, reference))
            }
        }
    }

    /// Settlement writes nothing; the accepted call is the attestation.
    fn settlement(state: &ContractState, account: Address, reference: Digest) -> Transition {
        let mut transition = Transition::unchanged(state.global.clone());
        transition
            .events
            .push(ContractEvent::BridgeSettled { account, reference });
        transition
    }

    fn opt_in(state: &ContractState, sender: &Address) -> Result<Transition, ContractError> {
        if state.account(sender).is_some() {
            return Err(ContractError::AlreadyOptedIn(*sender));
        }
        let mut transition = Transition::unchanged(state.global.clone());
        transition
            .account_writes
            .insert(*sender, AccountWrite::Put(AccountState::default()));
        transition
            .events
            .push(ContractEvent::OptedIn { account: *sender });
        Ok(transition)
    }

    fn close_out(state: &ContractState, sender: &Address) -> Result<Transition, ContractError> {
        let record = opted_in(state, sender)?;
        invariant_closeout_allowed(sender, &record)?;

        let mut transition = Transition::unchanged(state.global.clone());
        transition
            .account_writes
            .insert(*sender, AccountWrite::Delete);
        transition
            .events
            .push(ContractEvent::ClosedOut { account: *sender });
        Ok(transition)
    }

    fn clear_state(state: &ContractState, sender: &Address) -> Result<Transition, ContractError> {
        let record = opted_in(state, sender)?;

        let mut transition = Transition::unchanged(state.global.clone());
        transition
            .account_writes
            .insert(*sender, AccountWrite::Delete);
        transition.events.push(ContractEvent::StateCleared {
            account: *sender,
            abandoned_stake: record.stake_amount,
        });
        Ok(transition)
    }

    fn delete(state: &ContractState, sender: &Address) -> Result<Transition, ContractError> {
        authorize(state, sender)?;
        let mut transition = Transition::unchanged(state.global.clone());
        transition.delete_application = true;
        transition.events.push(ContractEvent::ApplicationDeleted);
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommitmentStatus, ErrorCategory, Operation, Payment};

    const ADMIN: Address = Address::new([1u8; 32]);
    const USER: Address = Address::new([2u8; 32]);
    const STRANGER: Address = Address::new([3u8; 32]);

    fn program() -> ApprovalProgram {
        ApprovalProgram::new(ExecutionContext::new(1001))
    }

    fn state_with_user() -> ContractState {
        let (mut state, _) = ApprovalProgram::on_create(ADMIN);
        state.accounts.insert(USER, AccountState::default());
        state
    }

    fn stake(state: &mut ContractState, amount: u64) {
        let method = Method::CreateCommitment {
            commitment_hash: Digest::new([8u8; 32]),
            duration: 30,
        };
        let group = OperationGroup::funded_call(
            USER,
            program().context().app_address,
            amount,
            method.encode(),
        );
        let transition = program().evaluate(state, &group).unwrap();
        state.commit(&transition);
    }

    fn admin_call(method: &Method) -> OperationGroup {
        OperationGroup::call(ADMIN, OnCompletion::NoOp, method.encode())
    }

    #[test]
    fn test_on_create() {
        let (state, event) = ApprovalProgram::on_create(ADMIN);
        assert_eq!(state.global.admin, ADMIN);
        assert_eq!(state.global.total_commitments, 0);
        assert!(state.accounts.is_empty());
        assert_eq!(event, ContractEvent::ApplicationCreated { admin: ADMIN });
    }

    #[test]
    fn test_create_commitment_through_router() {
        let mut state = state_with_user();
        stake(&mut state, 1_000_000);
        let record = state.account(&USER).unwrap();
        assert_eq!(record.commitment_status, CommitmentStatus::Active);
        assert_eq!(record.stake_amount, 1_000_000);
        assert_eq!(record.commitment_hash, Some(Digest::new([8u8; 32])));
        assert_eq!(state.global.total_commitments, 1);
    }

    #[test]
    fn test_verify_success_declares_refund() {
        let mut state = state_with_user();
        stake(&mut state, 250);
        let transition = program()
            .evaluate(
                &state,
                &admin_call(&Method::VerifySession {
                    account: USER,
                    success: true,
                }),
            )
            .unwrap();
        assert_eq!(
            transition.inner_transfers,
            vec![InnerTransfer {
                receiver: USER,
                amount: 250
            }]
        );
    }

    #[test]
    fn test_verify_failure_declares_no_transfer() {
        let mut state = state_with_user();
        stake(&mut state, 250);
        let transition = program()
            .evaluate(
                &state,
                &admin_call(&Method::VerifySession {
                    account: USER,
                    success: false,
                }),
            )
            .unwrap();
        assert!(transition.inner_transfers.is_empty());
        assert_eq!(
            transition.events,
            vec![ContractEvent::SessionVerified {
                account: USER,
                success: false,
                refunded: 0,
                forfeited: 250
            }]
        );
    }

    #[test]
    fn test_admin_methods_reject_stranger() {
        let mut state = state_with_user();
        stake(&mut state, 100);
        let methods = [
            Method::VerifySession {
                account: USER,
                success: true,
            },
            Method::ApplyPenalty { account: USER },
            Method::LogDiscipline {
                account: USER,
                score: 50,
            },
            Method::SettleBridge {
                account: USER,
                reference: Digest::default(),
            },
        ];
        for method in methods {
            let group = OperationGroup::call(STRANGER, OnCompletion::NoOp, method.encode());
            let err = program().evaluate(&state, &group).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::AuthorizationFailure);
        }
    }

    #[test]
    fn test_update_always_rejected() {
        let state = state_with_user();
        let group = OperationGroup::call(ADMIN, OnCompletion::UpdateApplication, vec![]);
        assert_eq!(
            program().evaluate(&state, &group),
            Err(ContractError::UpdateRejected)
        );
    }

    #[test]
    fn test_delete_admin_only() {
        let state = state_with_user();
        let denied = OperationGroup::call(USER, OnCompletion::DeleteApplication, vec![]);
        assert!(program().evaluate(&state, &denied).is_err());

        let allowed = OperationGroup::call(ADMIN, OnCompletion::DeleteApplication, vec![]);
        assert!(program().evaluate(&state, &allowed).unwrap().delete_application);
    }

    #[test]
    fn test_double_opt_in_rejected() {
        let state = state_with_user();
        let group = OperationGroup::call(USER, OnCompletion::OptIn, vec![]);
        assert_eq!(
            program().evaluate(&state, &group),
            Err(ContractError::AlreadyOptedIn(USER))
        );
    }

    #[test]
    fn test_close_out_blocked_while_active() {
        let mut state = state_with_user();
        stake(&mut state, 100);
        let group = OperationGroup::call(USER, OnCompletion::CloseOut, vec![]);
        assert_eq!(
            program().evaluate(&state, &group),
            Err(ContractError::CommitmentActive(USER))
        );
    }

    #[test]
    fn test_clear_state_allowed_while_active() {
        let mut state = state_with_user();
        stake(&mut state, 100);
        let group = OperationGroup::call(USER, OnCompletion::ClearState, vec![]);
        let transition = program().evaluate(&state, &group).unwrap();
        state.commit(&transition);
        assert!(state.account(&USER).is_none());
        assert_eq!(
            transition.events,
            vec![ContractEvent::StateCleared {
                account: USER,
                abandoned_stake: 100
            }]
        );
    }

    #[test]
    fn test_settle_bridge_needs_no_opt_in() {
        let state = state_with_user();
        let transition = program()
            .evaluate(
                &state,
                &admin_call(&Method::SettleBridge {
                    account: STRANGER,
                    reference: Digest::new([6u8; 32]),
                }),
            )
            .unwrap();
        assert!(transition.account_writes.is_empty());
        assert_eq!(transition.global, state.global);
    }

    #[test]
    fn test_bridge_intent_requires_opt_in() {
        let state = state_with_user();
        let group = OperationGroup::funded_call(
            STRANGER,
            program().context().app_address,
            10,
            Method::BridgeIntent {
                reference: Digest::default(),
            }
            .encode(),
        );
        assert_eq!(
            program().evaluate(&state, &group),
            Err(ContractError::NotOptedIn(STRANGER))
        );
    }

    #[test]
    fn test_admin_call_rejects_attached_payment() {
        let mut state = state_with_user();
        stake(&mut state, 100);
        let verify = Method::VerifySession {
            account: USER,
            success: false,
        };
        let group = OperationGroup::new(vec![
            Operation::Payment(Payment {
                sender: STRANGER,
                receiver: ADMIN,
                amount: 50,
            }),
            Operation::AppCall(AppCall {
                sender: ADMIN,
                on_completion: OnCompletion::NoOp,
                args: verify.encode(),
            }),
        ]);
        assert_eq!(
            program().evaluate(&state, &group),
            Err(ContractError::InvalidGroupSize {
                expected: 1,
                got: 2
            })
        );
    }

    #[test]
    fn test_lifecycle_call_rejects_attached_payment() {
        let state = state_with_user();
        let group = OperationGroup::new(vec![
            Operation::Payment(Payment {
                sender: USER,
                receiver: STRANGER,
                amount: 1,
            }),
            Operation::AppCall(AppCall {
                sender: STRANGER,
                on_completion: OnCompletion::OptIn,
                args: vec![],
            }),
        ]);
        assert!(matches!(
            program().evaluate(&state, &group),
            Err(ContractError::InvalidGroupSize { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_empty_group_rejected() {
        let state = state_with_user();
        assert!(program()
            .evaluate(&state, &OperationGroup::new(vec![]))
            .is_err());
    }
}
