use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use txbench_sdk::rpc::SEND_RAW_TRANSACTION;
use txbench_sdk::{Account, Address, Felt, RpcError, SignError, Transaction, TxHash};

use crate::core::client::{SubmitterFactory, TransactionSigner, TransactionSubmitter};

pub fn endpoints(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("http://127.0.0.{}:20336", i + 1)).collect()
}

pub fn test_account() -> Account {
    Account::from_private_key("bench", Felt::from(0x5eed_u64))
}

pub fn transfer_template(sender: Address) -> Transaction {
    Transaction::new_transfer(0, 20_000, txbench_sdk::native::ONT_CONTRACT, sender, Address::native(0x42), 1)
}

/// In-memory node: records every nonce it receives and rejects every `reject_every`th one.
pub struct RecordingSubmitter {
    endpoint: String,
    reject_every: Option<u32>,
    nonces: Mutex<Vec<u32>>,
}

impl RecordingSubmitter {
    pub fn nonces(&self) -> Vec<u32> {
        self.nonces.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSubmitter for RecordingSubmitter {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<TxHash, RpcError> {
        let nonce = tx.nonce();
        self.nonces.lock().unwrap().push(nonce);
        match self.reject_every {
            Some(n) if (nonce + 1) % n == 0 => {
                Err(RpcError::Node { method: SEND_RAW_TRANSACTION, code: 43001, desc: "rejected".to_string() })
            }
            _ => Ok(tx.hash().unwrap()),
        }
    }
}

/// Hands out one [`RecordingSubmitter`] per connection, in connection order.
#[derive(Default)]
pub struct RecordingFactory {
    reject_every: Option<u32>,
    connections: Mutex<Vec<Arc<RecordingSubmitter>>>,
}

impl RecordingFactory {
    pub fn rejecting_every(n: u32) -> Self {
        Self { reject_every: Some(n), ..Default::default() }
    }

    pub fn connections(&self) -> Vec<Arc<RecordingSubmitter>> {
        self.connections.lock().unwrap().clone()
    }
}

impl SubmitterFactory for RecordingFactory {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn TransactionSubmitter>, RpcError> {
        let submitter = Arc::new(RecordingSubmitter {
            endpoint: endpoint.to_string(),
            reject_every: self.reject_every,
            nonces: Mutex::new(Vec::new()),
        });
        self.connections.lock().unwrap().push(submitter.clone());
        Ok(submitter)
    }
}

/// Signs like the wrapped account except for one poisoned nonce.
pub struct FaultySigner {
    pub account: Account,
    pub poisoned_nonce: u32,
}

impl TransactionSigner for FaultySigner {
    fn address(&self) -> Address {
        self.account.address()
    }

    fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), SignError> {
        if tx.nonce() == self.poisoned_nonce {
            return Err(SignError::Ecdsa("key material corrupted".to_string()));
        }
        self.account.sign_transaction(tx)
    }
}
