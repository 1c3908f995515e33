//! JSON wallet files holding one or more signing accounts.

use crate::account::Account;
use crate::address::{Address, AddressError};
use serde::{Deserialize, Serialize};
use starknet_core::utils::starknet_keccak;
use starknet_types_core::felt::Felt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Failed to open wallet {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse wallet {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Wallet has no accounts")]
    NoAccounts,
    #[error("Wrong password for account {0}")]
    WrongPassword(String),
    #[error("Invalid {field} for account {label}: {reason}")]
    InvalidHex { label: String, field: &'static str, reason: String },
    #[error("Account {label} address {expected} does not match its key (derived {derived})")]
    AddressMismatch { label: String, expected: Address, derived: Address },
    #[error(transparent)]
    Address(#[from] AddressError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    pub label: String,
    pub address: String,
    #[serde(default)]
    pub is_default: bool,
    pub key: String,
    pub salt: String,
    pub password_hash: String,
}

impl WalletAccount {
    /// Builds an entry for `private_key` protected by `password`.
    pub fn create(label: impl Into<String>, private_key: Felt, password: &str, salt: &[u8]) -> Self {
        let account = Account::from_private_key("", private_key);
        Self {
            label: label.into(),
            address: account.address().to_string(),
            is_default: false,
            key: format!("0x{}", hex::encode(private_key.to_bytes_be())),
            salt: format!("0x{}", hex::encode(salt)),
            password_hash: format!("0x{}", hex::encode(password_digest(salt, password))),
        }
    }

    /// Checks the password and derives the signing account.
    pub fn unlock(&self, password: &str) -> Result<Account, WalletError> {
        let salt = self.decode_field("salt", &self.salt)?;
        let expected = self.decode_field("passwordHash", &self.password_hash)?;
        if password_digest(&salt, password).as_slice() != expected.as_slice() {
            return Err(WalletError::WrongPassword(self.label.clone()));
        }

        let key = self.decode_field("key", &self.key)?;
        if key.len() > 32 {
            return Err(WalletError::InvalidHex {
                label: self.label.clone(),
                field: "key",
                reason: format!("expected at most 32 bytes, got {}", key.len()),
            });
        }
        let mut padded = [0u8; 32];
        padded[32 - key.len()..].copy_from_slice(&key);

        let account = Account::from_private_key(self.label.clone(), Felt::from_bytes_be(&padded));
        let expected: Address = self.address.parse()?;
        if account.address() != expected {
            return Err(WalletError::AddressMismatch {
                label: self.label.clone(),
                expected,
                derived: account.address(),
            });
        }
        Ok(account)
    }

    fn decode_field(&self, field: &'static str, value: &str) -> Result<Vec<u8>, WalletError> {
        hex::decode(value.trim().strip_prefix("0x").unwrap_or(value.trim())).map_err(|err| WalletError::InvalidHex {
            label: self.label.clone(),
            field,
            reason: err.to_string(),
        })
    }
}

fn password_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(salt.len() + password.len());
    preimage.extend_from_slice(salt);
    preimage.extend_from_slice(password.as_bytes());
    starknet_keccak(&preimage).to_bytes_be()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(default)]
    pub name: String,
    pub accounts: Vec<WalletAccount>,
}

impl Wallet {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| WalletError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| WalletError::Parse { path: path.to_path_buf(), source })
    }

    /// The account flagged as default, or the first one.
    pub fn default_account_entry(&self) -> Result<&WalletAccount, WalletError> {
        self.accounts.iter().find(|account| account.is_default).or(self.accounts.first()).ok_or(WalletError::NoAccounts)
    }

    pub fn default_account(&self, password: &str) -> Result<Account, WalletError> {
        self.default_account_entry()?.unlock(password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn entry(label: &str, key: u64, is_default: bool) -> WalletAccount {
        WalletAccount { is_default, ..WalletAccount::create(label, Felt::from(key), "secret", b"salty") }
    }

    #[test]
    fn opens_and_unlocks_default_account() {
        let wallet = Wallet { name: "bench".into(), accounts: vec![entry("a", 11, false), entry("b", 22, true)] };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string_pretty(&wallet).unwrap().as_bytes()).unwrap();

        let opened = Wallet::open(file.path()).unwrap();
        let account = opened.default_account("secret").unwrap();
        assert_eq!(account.label(), "b");
        assert_eq!(account.address(), Account::from_private_key("", Felt::from(22u64)).address());
    }

    #[test]
    fn falls_back_to_first_account() {
        let wallet = Wallet { name: String::new(), accounts: vec![entry("a", 11, false), entry("b", 22, false)] };
        assert_eq!(wallet.default_account_entry().unwrap().label, "a");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let wallet = Wallet { name: String::new(), accounts: vec![entry("a", 11, true)] };
        assert_matches!(wallet.default_account("nope"), Err(WalletError::WrongPassword(label)) if label == "a");
    }

    #[test]
    fn address_must_match_key() {
        let mut account = entry("a", 11, true);
        account.address = Address::native(5).to_string();
        assert_matches!(account.unlock("secret"), Err(WalletError::AddressMismatch { .. }));
    }

    #[test]
    fn empty_wallet_has_no_default() {
        assert_matches!(Wallet::default().default_account("secret"), Err(WalletError::NoAccounts));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Wallet::open("/definitely/not/here.json").unwrap_err();
        assert_matches!(err, WalletError::Io { ref path, .. } if path.ends_with("here.json"));
    }
}
