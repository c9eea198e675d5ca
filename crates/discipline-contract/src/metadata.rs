//! # Contract Metadata
//!
//! ABI-style descriptor of the contract: state schema and method table.
//! Serialised to JSON for deployment tooling and backends.

use crate::domain::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contract name in the descriptor.
pub const CONTRACT_NAME: &str = "DisciplineEscrow";

/// Storage type of a state key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// 64-bit unsigned integer slot.
    Uint64,
    /// Byte-array slot.
    Bytes,
}

/// One state key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Storage type.
    #[serde(rename = "type")]
    pub key_type: KeyType,
    /// Description.
    pub descr: String,
}

/// Capacity and keys of one state scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSchema {
    /// Integer slots.
    pub num_uints: u32,
    /// Byte-array slots.
    pub num_byte_slices: u32,
    /// Named keys.
    pub keys: BTreeMap<String, KeySpec>,
}

impl ScopeSchema {
    fn from_keys(keys: &[(&str, KeyType, &str)]) -> Self {
        let count = |t: KeyType| {
            u32::try_from(keys.iter().filter(|(_, kt, _)| *kt == t).count()).unwrap_or(u32::MAX)
        };
        Self {
            num_uints: count(KeyType::Uint64),
            num_byte_slices: count(KeyType::Bytes),
            keys: keys
                .iter()
                .map(|(name, key_type, descr)| {
                    (
                        (*name).to_string(),
                        KeySpec {
                            key_type: *key_type,
                            descr: (*descr).to_string(),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Global and local schemas.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSchema {
    /// Application-wide record.
    pub global: ScopeSchema,
    /// Per-account record.
    pub local: ScopeSchema,
}

/// One method entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    /// Positional arguments after the selector.
    pub args: Vec<String>,
    /// Return type.
    pub returns: String,
    /// Description.
    pub descr: String,
    /// Needs a grouped funding payment.
    pub requires_payment: bool,
    /// Gated on the admin.
    pub admin_only: bool,
}

/// Full contract descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadata {
    /// Contract name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Crate version.
    pub version: String,
    /// State schema.
    pub state_schema: StateSchema,
    /// Methods keyed by selector.
    pub methods: BTreeMap<String, MethodSpec>,
}

impl ContractMetadata {
    /// Describe this contract.
    #[must_use]
    pub fn describe() -> Self {
        let global = ScopeSchema::from_keys(&[
            ("admin", KeyType::Bytes, "Operator address"),
            ("total_commitments", KeyType::Uint64, "Commitment counter"),
            ("total_penalties", KeyType::Uint64, "Penalty counter"),
            ("total_bridge_intents", KeyType::Uint64, "Bridge intent counter"),
        ]);
        let local = ScopeSchema::from_keys(&[
            ("stake_amount", KeyType::Uint64, "Escrowed stake in micro-units"),
            (
                "commitment_status",
                KeyType::Uint64,
                "0=none, 1=active, 2=completed, 3=failed",
            ),
            ("violations", KeyType::Uint64, "Violation counter"),
            ("discipline_score", KeyType::Uint64, "Latest score 0-100"),
            ("commitment_hash", KeyType::Bytes, "Digest of commitment metadata"),
        ]);

        let methods = [
            (
                Method::CREATE_COMMITMENT,
                &["commitment_hash (bytes32)", "duration (uint64)"][..],
                "Stake funds and register a commitment",
                true,
            ),
            (
                Method::VERIFY_SESSION,
                &["account (address)", "success (uint64 0/1)"][..],
                "Resolve an active commitment, returning or forfeiting the stake",
                false,
            ),
            (
                Method::APPLY_PENALTY,
                &["account (address)"][..],
                "Deduct 10% of the active stake and count a violation",
                false,
            ),
            (
                Method::LOG_DISCIPLINE,
                &["account (address)", "score (uint64 0-100)"][..],
                "Record the latest discipline score",
                false,
            ),
            (
                Method::BRIDGE_INTENT,
                &["reference_hash (bytes32)"][..],
                "Request a fiat payout of the accompanying transfer",
                true,
            ),
            (
                Method::SETTLE_BRIDGE,
                &["account (address)", "ref_hash (bytes32)"][..],
                "Attest that an off-ledger payout completed",
                false,
            ),
        ]
        .into_iter()
        .map(|(name, args, descr, requires_payment)| {
            (
                name.to_string(),
                MethodSpec {
                    args: args.iter().map(|a| (*a).to_string()).collect(),
                    returns: "void".to_string(),
                    descr: descr.to_string(),
                    requires_payment,
                    admin_only: !requires_payment,
                },
            )
        })
        .collect();

        Self {
            name: CONTRACT_NAME.to_string(),
            description: "Accountability escrow: stakes, verification, penalties, discipline scores and fiat bridge"
                .to_string(),
            version: crate::VERSION.to_string(),
            state_schema: StateSchema { global, local },
            methods,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
