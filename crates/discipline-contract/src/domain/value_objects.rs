//! # Domain Value Objects
//!
//! Immutable value types for the discipline contract.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha512_256};
use std::fmt;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 32;

/// Length of a commitment or bridge reference digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Domain separator used to derive application account addresses.
const APP_ADDRESS_PREFIX: &[u8] = b"appID";

/// Ledger account identifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Wrap raw address bytes.
    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode from a byte slice of exactly [`ADDRESS_LEN`] bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; ADDRESS_LEN]>::try_from(bytes).ok().map(Self)
    }

    /// Parse a hex-encoded address.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Escrow account owned by an application.
    #[must_use]
    pub fn for_application(app_id: u64) -> Self {
        let mut hasher = Sha512_256::new();
        hasher.update(APP_ADDRESS_PREFIX);
        hasher.update(app_id.to_be_bytes());
        Self(hasher.finalize().into())
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Fixed-size opaque digest referencing off-ledger metadata.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Decode from a byte slice of exactly [`DIGEST_LEN`] bytes.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; DIGEST_LEN]>::try_from(bytes).ok().map(Self)
    }

    /// Parse a hex-encoded digest.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Commitment lifecycle state machine.
///
/// Stored as a uint slot: 0=none, 1=active, 2=completed, 3=failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitmentStatus {
    /// No commitment made yet.
    #[default]
    None,
    /// Stake escrowed, outcome pending.
    Active,
    /// Verified successfully, stake returned.
    Completed,
    /// Verified as failed, stake forfeited.
    Failed,
}

impl CommitmentStatus {
    /// Stored slot value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        match self {
            Self::None => 0,
            Self::Active => 1,
            Self::Completed => 2,
            Self::Failed => 3,
        }
    }

    /// Decode a stored slot value.
    #[must_use]
    pub fn from_u64(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Active),
            2 => Some(Self::Completed),
            3 => Some(Self::Failed),
            _ => None,
        }
    }

    /// Check if transition is valid.
    #[must_use]
    pub fn can_transition_to(self, next: CommitmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::None | Self::Completed | Self::Failed, Self::Active)
                | (Self::Active, Self::Completed | Self::Failed)
        )
    }

    /// Check if a commitment is outstanding.
    #[must_use]
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl fmt::Display for CommitmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// What the runtime does with the application after a call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCompletion {
    /// Plain method invocation.
    #[default]
    NoOp,
    /// Allocate the caller's local record.
    OptIn,
    /// Release the caller's local record.
    CloseOut,
    /// Drop the caller's local record unconditionally.
    ClearState,
    /// Replace the application logic.
    UpdateApplication,
    /// Remove the application.
    DeleteApplication,
}

impl fmt::Display for OnCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoOp => "NoOp",
            Self::OptIn => "OptIn",
            Self::CloseOut => "CloseOut",
            Self::ClearState => "ClearState",
            Self::UpdateApplication => "UpdateApplication",
            Self::DeleteApplication => "DeleteApplication",
        };
        f.write_str(name)
    }
}
