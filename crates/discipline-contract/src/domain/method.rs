//! # Method Selection
//!
//! Decodes the positional byte-string arguments of a `NoOp` call into a
//! strongly typed [`Method`]. Argument 0 is the selector and must match a
//! method name exactly. Extra trailing arguments are ignored.

use super::errors::ContractError;
use super::value_objects::{Address, Digest};
use serde::{Deserialize, Serialize};

/// Widest unsigned integer argument, in bytes.
const MAX_UINT_ARG_LEN: usize = 8;

/// Application methods reachable through a `NoOp` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Method {
    /// Stake funds against a commitment.
    CreateCommitment {
        /// Digest of the off-ledger commitment metadata.
        commitment_hash: Digest,
        /// Declared duration. Carried but not used by the contract.
        duration: u64,
    },
    /// Operator resolves an active commitment.
    VerifySession {
        /// Account whose commitment is resolved.
        account: Address,
        /// Session outcome.
        success: bool,
    },
    /// Operator deducts a penalty from an active stake.
    ApplyPenalty {
        /// Penalised account.
        account: Address,
    },
    /// Operator records the latest discipline score.
    LogDiscipline {
        /// Scored account.
        account: Address,
        /// Score, validated against `0..=100` by the logger.
        score: u64,
    },
    /// User requests a fiat payout for the accompanying transfer.
    BridgeIntent {
        /// Hashed payout reference.
        reference: Digest,
    },
    /// Operator attests that an off-ledger payout completed.
    SettleBridge {
        /// Account that was paid out.
        account: Address,
        /// Hashed settlement reference.
        reference: Digest,
    },
}

impl Method {
    /// Selector for [`Method::CreateCommitment`].
    pub const CREATE_COMMITMENT: &'static str = "createCommitment";
    /// Selector for [`Method::VerifySession`].
    pub const VERIFY_SESSION: &'static str = "verifySession";
    /// Selector for [`Method::ApplyPenalty`].
    pub const APPLY_PENALTY: &'static str = "applyPenalty";
    /// Selector for [`Method::LogDiscipline`].
    pub const LOG_DISCIPLINE: &'static str = "logDiscipline";
    /// Selector for [`Method::BridgeIntent`].
    pub const BRIDGE_INTENT: &'static str = "bridgeIntent";
    /// Selector for [`Method::SettleBridge`].
    pub const SETTLE_BRIDGE: &'static str = "settleBridge";

    /// All selectors, in routing order.
    pub const SELECTORS: [&'static str; 6] = [
        Self::CREATE_COMMITMENT,
        Self::VERIFY_SESSION,
        Self::APPLY_PENALTY,
        Self::LOG_DISCIPLINE,
        Self::BRIDGE_INTENT,
        Self::SETTLE_BRIDGE,
    ];

    /// Decode a call's arguments.
    pub fn decode(args: &[Vec<u8>]) -> Result<Self, ContractError> {
        let selector = args.first().ok_or(ContractError::MissingMethodSelector)?;

        match selector.as_slice() {
            b"createCommitment" => {
                let method = Self::CREATE_COMMITMENT;
                require_args(method, args, 2)?;
                // duration is optional on the wire
                let duration = match args.get(2) {
                    Some(raw) => decode_uint(method, 2, raw)?,
                    None => 0,
                };
                Ok(Self::CreateCommitment {
                    commitment_hash: decode_digest(method, 1, &args[1])?,
                    duration,
                })
            }
            b"verifySession" => {
                let method = Self::VERIFY_SESSION;
                require_args(method, args, 3)?;
                Ok(Self::VerifySession {
                    account: decode_address(method, 1, &args[1])?,
                    success: decode_flag(method, 2, &args[2])?,
                })
            }
            b"applyPenalty" => {
                let method = Self::APPLY_PENALTY;
                require_args(method, args, 2)?;
                Ok(Self::ApplyPenalty {
                    account: decode_address(method, 1, &args[1])?,
                })
            }
            b"logDiscipline" => {
                let method = Self::LOG_DISCIPLINE;
                require_args(method, args, 3)?;
                Ok(Self::LogDiscipline {
                    account: decode_address(method, 1, &args[1])?,
                    score: decode_uint(method, 2, &args[2])?,
                })
            }
            b"bridgeIntent" => {
                let method = Self::BRIDGE_INTENT;
                require_args(method, args, 2)?;
                Ok(Self::BridgeIntent {
                    reference: decode_digest(method, 1, &args[1])?,
                })
            }
            b"settleBridge" => {
                let method = Self::SETTLE_BRIDGE;
                require_args(method, args, 3)?;
                Ok(Self::SettleBridge {
                    account: decode_address(method, 1, &args[1])?,
                    reference: decode_digest(method, 2, &args[2])?,
                })
            }
            other => Err(ContractError::UnknownMethod(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    /// Encode into positional call arguments.
    #[must_use]
    pub fn encode(&self) -> Vec<Vec<u8>> {
        let mut args = vec![self.name().as_bytes().to_vec()];
        match self {
            Self::CreateCommitment {
                commitment_hash,
                duration,
            } => {
                args.push(commitment_hash.as_bytes().to_vec());
                args.push(duration.to_be_bytes().to_vec());
            }
            Self::VerifySession { account, success } => {
                args.push(account.as_bytes().to_vec());
                args.push(u64::from(*success).to_be_bytes().to_vec());
            }
            Self::ApplyPenalty { account } => {
                args.push(account.as_bytes().to_vec());
            }
            Self::LogDiscipline { account, score } => {
                args.push(account.as_bytes().to_vec());
                args.push(score.to_be_bytes().to_vec());
            }
            Self::BridgeIntent { reference } => {
                args.push(reference.as_bytes().to_vec());
            }
            Self::SettleBridge { account, reference } => {
                args.push(account.as_bytes().to_vec());
                args.push(reference.as_bytes().to_vec());
            }
        }
        args
    }

    /// Selector string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCommitment { .. } => Self::CREATE_COMMITMENT,
            Self::VerifySession { .. } => Self::VERIFY_SESSION,
            Self::ApplyPenalty { .. } => Self::APPLY_PENALTY,
            Self::LogDiscipline { .. } => Self::LOG_DISCIPLINE,
            Self::BridgeIntent { .. } => Self::BRIDGE_INTENT,
            Self::SettleBridge { .. } => Self::SETTLE_BRIDGE,
        }
    }

    /// Check if the method is gated on the admin.
    #[must_use]
    pub fn is_admin_only(&self) -> bool {
        !self.requires_payment()
    }

    /// Check if the method must be funded by a grouped payment.
    #[must_use]
    pub fn requires_payment(&self) -> bool {
        matches!(
            self,
            Self::CreateCommitment { .. } | Self::BridgeIntent { .. }
        )
    }
}

fn require_args(method: &'static str, args: &[Vec<u8>], expected: usize) -> Result<(), ContractError> {
    if args.len() < expected {
        return Err(ContractError::InsufficientArguments {
            method,
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

/// Big-endian unsigned integer of at most eight bytes; empty decodes to zero.
fn decode_uint(method: &'static str, index: usize, raw: &[u8]) -> Result<u64, ContractError> {
    if raw.len() > MAX_UINT_ARG_LEN {
        return Err(ContractError::MalformedArgument {
            method,
            index,
            reason: format!("integer wider than {MAX_UINT_ARG_LEN} bytes"),
        });
    }
    Ok(raw.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

fn decode_flag(method: &'static str, index: usize, raw: &[u8]) -> Result<bool, ContractError> {
    match decode_uint(method, index, raw)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ContractError::MalformedArgument {
            method,
            index,
            reason: format!("flag must be 0 or 1, got {other}"),
        }),
    }
}

fn decode_address(method: &'static str, index: usize, raw: &[u8]) -> Result<Address, ContractError> {
    Address::from_slice(raw).ok_or_else(|| ContractError::MalformedArgument {
        method,
        index,
        reason: format!("address must be 32 bytes, got {}", raw.len()),
    })
}

fn decode_digest(method: &'static str, index: usize, raw: &[u8]) -> Result<Digest, ContractError> {
    Digest::from_slice(raw).ok_or_else(|| ContractError::MalformedArgument {
        method,
        index,
        reason: format!("digest must be 32 bytes, got {}", raw.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Address {
        Address::new([4u8; 32])
    }

    #[test]
    fn test_decode_every_selector() {
        let methods = vec![
            Method::CreateCommitment {
                commitment_hash: Digest::new([1u8; 32]),
                duration: 7,
            },
            Method::VerifySession {
                account: account(),
                success: true,
            },
            Method::ApplyPenalty { account: account() },
            Method::LogDiscipline {
                account: account(),
                score: 88,
            },
            Method::BridgeIntent {
                reference: Digest::new([2u8; 32]),
            },
            Method::SettleBridge {
                account: account(),
                reference: Digest::new([3u8; 32]),
            },
        ];
        for method in methods {
            assert_eq!(Method::decode(&method.encode()).unwrap(), method);
        }
    }

    #[test]
    fn test_empty_args_rejected() {
        assert_eq!(
            Method::decode(&[]),
            Err(ContractError::MissingMethodSelector)
        );
    }

    #[test]
    fn test_unknown_selector_rejected() {
        let err = Method::decode(&[b"withdraw".to_vec()]).unwrap_err();
        assert_eq!(err, ContractError::UnknownMethod("withdraw".to_string()));
    }

    #[test]
    fn test_selector_is_case_sensitive() {
        assert!(matches!(
            Method::decode(&[b"ApplyPenalty".to_vec(), account().as_bytes().to_vec()]),
            Err(ContractError::UnknownMethod(_))
        ));
    }

    #[test]
    fn test_missing_argument_rejected() {
        let err = Method::decode(&[b"verifySession".to_vec(), account().as_bytes().to_vec()])
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::InsufficientArguments {
                method: "verifySession",
                expected: 3,
                got: 2,
            }
        );
    }

    #[test]
    fn test_trailing_arguments_tolerated() {
        let mut args = Method::ApplyPenalty { account: account() }.encode();
        args.push(b"extra".to_vec());
        assert!(Method::decode(&args).is_ok());
    }

    #[test]
    fn test_short_address_rejected() {
        let err = Method::decode(&[b"applyPenalty".to_vec(), vec![1u8; 20]]).unwrap_err();
        assert!(matches!(
            err,
            ContractError::MalformedArgument { index: 1, .. }
        ));
    }

    #[test]
    fn test_wide_integer_rejected() {
        let err = Method::decode(&[
            b"logDiscipline".to_vec(),
            account().as_bytes().to_vec(),
            vec![0u8; 9],
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ContractError::MalformedArgument { index: 2, .. }
        ));
    }

    #[test]
    fn test_compact_integer_encoding_accepted() {
        let method = Method::decode(&[
            b"logDiscipline".to_vec(),
            account().as_bytes().to_vec(),
            vec![100u8],
        ])
        .unwrap();
        assert_eq!(
            method,
            Method::LogDiscipline {
                account: account(),
                score: 100
            }
        );
    }

    #[test]
    fn test_flag_outside_zero_one_rejected() {
        let err = Method::decode(&[
            b"verifySession".to_vec(),
            account().as_bytes().to_vec(),
            vec![2u8],
        ])
        .unwrap_err();
        assert!(err.to_string().contains("0 or 1"));
    }

    #[test]
    fn test_create_commitment_without_duration() {
        let method =
            Method::decode(&[b"createCommitment".to_vec(), vec![9u8; 32]]).unwrap();
        assert_eq!(
            method,
            Method::CreateCommitment {
                commitment_hash: Digest::new([9u8; 32]),
                duration: 0
            }
        );
    }

    #[test]
    fn test_admin_and_payment_flags() {
        assert!(Method::BridgeIntent {
            reference: Digest::default()
        }
        .requires_payment());
        assert!(Method::SettleBridge {
            account: account(),
            reference: Digest::default()
        }
        .is_admin_only());
    }
}
