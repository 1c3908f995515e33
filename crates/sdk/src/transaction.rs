use crate::address::Address;
use serde::{Deserialize, Serialize};
use starknet_core::utils::starknet_keccak;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TX_VERSION: u8 = 0;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode transaction: {0}")]
    Encode(#[source] bincode::Error),
    #[error("Failed to decode transaction: {0}")]
    Decode(#[source] bincode::Error),
    #[error("Invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Hash identifying a transaction, computed over its unsigned body.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({self})")
    }
}

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut out = [0u8; 32];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut out)?;
        Ok(Self(out))
    }
}

/// Typed argument of a contract invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Param {
    Address(Address),
    Int(u128),
    Bytes(Vec<u8>),
    String(String),
}

impl From<Address> for Param {
    fn from(value: Address) -> Self {
        Param::Address(value)
    }
}

impl From<u64> for Param {
    fn from(value: u64) -> Self {
        Param::Int(value.into())
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::String(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Native asset transfer handled by the asset's native contract.
    Transfer { asset: Address, from: Address, to: Address, amount: u64 },
    Invoke { contract: Address, method: String, args: Vec<Param> },
    Deploy { code: Vec<u8>, name: String, version: String, author: String, email: String, description: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    pub version: u8,
    pub nonce: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub payer: Address,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub public_key: [u8; 32],
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// A transaction body plus the signatures collected over its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub body: TransactionBody,
    pub signatures: Vec<Signature>,
}

impl Transaction {
    fn unsigned(gas_price: u64, gas_limit: u64, payload: Payload) -> Self {
        Self {
            body: TransactionBody {
                version: TX_VERSION,
                nonce: 0,
                gas_price,
                gas_limit,
                payer: Address::ZERO,
                payload,
            },
            signatures: Vec::new(),
        }
    }

    pub fn new_transfer(
        gas_price: u64,
        gas_limit: u64,
        asset: Address,
        from: Address,
        to: Address,
        amount: u64,
    ) -> Self {
        Self::unsigned(gas_price, gas_limit, Payload::Transfer { asset, from, to, amount })
    }

    pub fn new_invoke(
        gas_price: u64,
        gas_limit: u64,
        contract: Address,
        method: impl Into<String>,
        args: Vec<Param>,
    ) -> Self {
        Self::unsigned(gas_price, gas_limit, Payload::Invoke { contract, method: method.into(), args })
    }

    pub fn new_deploy(gas_price: u64, gas_limit: u64, code: Vec<u8>, metadata: DeployMetadata) -> Self {
        let DeployMetadata { name, version, author, email, description } = metadata;
        Self::unsigned(gas_price, gas_limit, Payload::Deploy { code, name, version, author, email, description })
    }

    pub fn nonce(&self) -> u32 {
        self.body.nonce
    }

    pub fn set_nonce(&mut self, nonce: u32) {
        self.body.nonce = nonce;
    }

    /// Hash over the unsigned body. Signatures never affect it.
    pub fn hash(&self) -> Result<TxHash, CodecError> {
        let encoded = bincode::serialize(&self.body).map_err(CodecError::Encode)?;
        Ok(TxHash(starknet_keccak(&encoded).to_bytes_be()))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(CodecError::Encode)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        bincode::deserialize(bytes).map_err(CodecError::Decode)
    }

    pub fn to_hex(&self) -> Result<String, CodecError> {
        Ok(hex::encode(self.to_bytes()?))
    }

    pub fn from_hex(s: &str) -> Result<Self, CodecError> {
        Self::from_bytes(&hex::decode(s.trim())?)
    }
}

/// Descriptive fields stored alongside deployed contract code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployMetadata {
    pub name: String,
    pub version: String,
    pub author: String,
    pub email: String,
    pub description: String,
}
