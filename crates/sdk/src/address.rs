use serde::{Deserialize, Serialize};
use starknet_core::utils::starknet_keccak;
use starknet_types_core::felt::Felt;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ADDRESS_LEN: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid hex in address `{0}`")]
    InvalidHex(String),
    #[error("Address `{value}` must be 20 bytes, got {len}")]
    InvalidLength { value: String, len: usize },
}

/// 20-byte account or contract identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const ZERO: Address = Address([0; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Address of a native contract, identified by its trailing byte.
    pub const fn native(id: u8) -> Self {
        let mut bytes = [0; ADDRESS_LEN];
        bytes[ADDRESS_LEN - 1] = id;
        Self(bytes)
    }

    /// Address owned by a public key: the last 20 bytes of the keccak of its big-endian encoding.
    pub fn from_public_key(public_key: &Felt) -> Self {
        Self::from_digest(&starknet_keccak(&public_key.to_bytes_be()))
    }

    /// Address a contract is deployed at, derived from its code.
    pub fn from_code(code: &[u8]) -> Self {
        Self::from_digest(&starknet_keccak(code))
    }

    fn from_digest(digest: &Felt) -> Self {
        let bytes = digest.to_bytes_be();
        let mut out = [0; ADDRESS_LEN];
        out.copy_from_slice(&bytes[32 - ADDRESS_LEN..]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; ADDRESS_LEN]
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        let len = bytes.len();
        let bytes: [u8; ADDRESS_LEN] =
            bytes.try_into().map_err(|_| AddressError::InvalidLength { value: s.to_string(), len })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}
