//! # Validation Pipeline
//!
//! Shape checks shared by the method handlers. Every check is fail-fast and
//! none of them touches state.

use crate::domain::{
    invariant_admin, AccountState, Address, ContractError, ContractState, ExecutionContext,
    OperationGroup, Payment,
};

/// Size of a transfer-plus-call group.
pub const FUNDED_GROUP_SIZE: usize = 2;

/// Validate a transfer-plus-call unit and return its funding payment.
///
/// The group must be exactly `[payment, call]`, the payment must go to the
/// application account, carry a positive amount and come from the caller.
pub fn validate_funding_group<'g>(
    group: &'g OperationGroup,
    call_index: usize,
    caller: &Address,
    ctx: &ExecutionContext,
) -> Result<&'g Payment, ContractError> {
    if group.len() != FUNDED_GROUP_SIZE {
        return Err(ContractError::InvalidGroupSize {
            expected: FUNDED_GROUP_SIZE,
            got: group.len(),
        });
    }
    if call_index != FUNDED_GROUP_SIZE - 1 {
        return Err(ContractError::InvalidGroupShape(
            "application call must follow the funding payment".to_string(),
        ));
    }

    let payment = group.payment(0).ok_or(ContractError::ExpectedPayment(0))?;
    if payment.receiver != ctx.app_address {
        return Err(ContractError::PaymentReceiverMismatch {
            expected: ctx.app_address,
            got: payment.receiver,
        });
    }
    if payment.amount == 0 {
        return Err(ContractError::ZeroPayment);
    }
    if payment.sender != *caller {
        return Err(ContractError::PaymentSenderMismatch {
            caller: *caller,
            payer: payment.sender,
        });
    }
    Ok(payment)
}

/// Calls that take no funding must be submitted alone.
pub fn require_lone_call(group: &OperationGroup) -> Result<(), ContractError> {
    if group.len() != 1 {
        return Err(ContractError::InvalidGroupSize {
            expected: 1,
            got: group.len(),
        });
    }
    Ok(())
}

/// Authorization guard for operator methods.
pub fn authorize(state: &ContractState, caller: &Address) -> Result<(), ContractError> {
    invariant_admin(&state.global, caller)
}

/// Working copy of an opted-in account's record.
pub fn opted_in(state: &ContractState, account: &Address) -> Result<AccountState, ContractError> {
    state
        .account(account)
        .cloned()
        .ok_or(ContractError::NotOptedIn(*account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppCall, OnCompletion, Operation};

    fn addr(b: u8) -> Address {
        Address::new([b; 32])
    }

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(77)
    }

    #[test]
    fn test_valid_funding_group() {
        let group = OperationGroup::funded_call(addr(2), ctx().app_address, 500, vec![]);
        let payment = validate_funding_group(&group, 1, &addr(2), &ctx()).unwrap();
        assert_eq!(payment.amount, 500);
    }

    #[test]
    fn test_lone_call_rejected() {
        let group = OperationGroup::call(addr(2), OnCompletion::NoOp, vec![]);
        assert_eq!(
            validate_funding_group(&group, 0, &addr(2), &ctx()),
            Err(ContractError::InvalidGroupSize {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_wrong_receiver_rejected() {
        let group = OperationGroup::funded_call(addr(2), addr(3), 500, vec![]);
        assert!(matches!(
            validate_funding_group(&group, 1, &addr(2), &ctx()),
            Err(ContractError::PaymentReceiverMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let group = OperationGroup::funded_call(addr(2), ctx().app_address, 0, vec![]);
        assert_eq!(
            validate_funding_group(&group, 1, &addr(2), &ctx()),
            Err(ContractError::ZeroPayment)
        );
    }

    #[test]
    fn test_foreign_payer_rejected() {
        let group = OperationGroup::new(vec![
            Operation::Payment(Payment {
                sender: addr(9),
                receiver: ctx().app_address,
                amount: 500,
            }),
            Operation::AppCall(AppCall {
                sender: addr(2),
                on_completion: OnCompletion::NoOp,
                args: vec![],
            }),
        ]);
        assert!(matches!(
            validate_funding_group(&group, 1, &addr(2), &ctx()),
            Err(ContractError::PaymentSenderMismatch { .. })
        ));
    }

    #[test]
    fn test_call_before_payment_rejected() {
        let group = OperationGroup::new(vec![
            Operation::AppCall(AppCall {
                sender: addr(2),
                on_completion: OnCompletion::NoOp,
                args: vec![],
            }),
            Operation::Payment(Payment {
                sender: addr(2),
                receiver: ctx().app_address,
                amount: 500,
            }),
        ]);
        assert!(matches!(
            validate_funding_group(&group, 0, &addr(2), &ctx()),
            Err(ContractError::InvalidGroupShape(_))
        ));
    }

    #[test]
    fn test_lone_call() {
        let lone = OperationGroup::call(addr(1), OnCompletion::NoOp, vec![]);
        assert!(require_lone_call(&lone).is_ok());

        let with_payment = OperationGroup::funded_call(addr(1), addr(9), 5, vec![]);
        assert_eq!(
            require_lone_call(&with_payment),
            Err(ContractError::InvalidGroupSize {
                expected: 1,
                got: 2
            })
        );
    }

    #[test]
    fn test_opted_in_lookup() {
        let mut state = ContractState::create(addr(1));
        assert_eq!(
            opted_in(&state, &addr(2)),
            Err(ContractError::NotOptedIn(addr(2)))
        );
        state.accounts.insert(addr(2), AccountState::default());
        assert!(opted_in(&state, &addr(2)).is_ok());
    }
}
