use crate::address::Address;
use crate::transaction::{CodecError, Signature, Transaction};
use starknet_signers::SigningKey;
use starknet_types_core::felt::Felt;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("Failed to hash transaction: {0}")]
    Codec(#[from] CodecError),
    #[error("ECDSA signing failed: {0}")]
    Ecdsa(String),
    #[error("Transaction payer {payer} does not match signer {signer}")]
    PayerMismatch { payer: Address, signer: Address },
}

/// A signing account. Signing is a pure function of the key and the transaction, so one account can be
/// shared by concurrent workers.
#[derive(Clone)]
pub struct Account {
    label: String,
    address: Address,
    public_key: Felt,
    signing_key: SigningKey,
}

impl Account {
    pub fn from_private_key(label: impl Into<String>, private_key: Felt) -> Self {
        let signing_key = SigningKey::from_secret_scalar(private_key);
        let public_key = signing_key.verifying_key().scalar();
        Self { label: label.into(), address: Address::from_public_key(&public_key), public_key, signing_key }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn public_key(&self) -> Felt {
        self.public_key
    }

    /// Signs `tx` in place.
    ///
    /// The payer defaults to this account. Any previous signatures are discarded, so signing a clone of a template
    /// after changing its nonce always yields exactly one signature over the current body.
    pub fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), SignError> {
        if tx.body.payer.is_zero() {
            tx.body.payer = self.address;
        } else if tx.body.payer != self.address {
            return Err(SignError::PayerMismatch { payer: tx.body.payer, signer: self.address });
        }

        let hash = Felt::from_bytes_be(&tx.hash()?.0);
        let signature = self.signing_key.sign(&hash).map_err(|err| SignError::Ecdsa(format!("{err:?}")))?;

        tx.signatures.clear();
        tx.signatures.push(Signature {
            public_key: self.public_key.to_bytes_be(),
            r: signature.r.to_bytes_be(),
            s: signature.s.to_bytes_be(),
        });
        Ok(())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account").field("label", &self.label).field("address", &self.address).finish_non_exhaustive()
    }
}

/// Checks every signature of `tx` against its hash, and that the payer signed it.
pub fn verify_transaction(tx: &Transaction) -> Result<bool, CodecError> {
    if tx.signatures.is_empty() {
        return Ok(false);
    }
    let hash = Felt::from_bytes_be(&tx.hash()?.0);
    let mut payer_signed = false;
    for signature in &tx.signatures {
        let public_key = Felt::from_bytes_be(&signature.public_key);
        let valid = starknet_crypto::verify(
            &public_key,
            &hash,
            &Felt::from_bytes_be(&signature.r),
            &Felt::from_bytes_be(&signature.s),
        )
        .unwrap_or(false);
        if !valid {
            return Ok(false);
        }
        payer_signed |= Address::from_public_key(&public_key) == tx.body.payer;
    }
    Ok(payer_signed)
}
