// Seams between the emission engine and the chain SDK

pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;
use txbench_sdk::{Account, Address, RpcError, SignError, Transaction, TxHash};

pub use rpc::RpcSubmitterFactory;

/// Signs per iteration transactions. Implementations must be reentrant: one signer is shared by every worker.
#[cfg_attr(test, mockall::automock)]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> Address;
    fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), SignError>;
}

/// Sends signed transactions to one node.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    fn endpoint(&self) -> String;
    async fn send_transaction(&self, tx: &Transaction) -> Result<TxHash, RpcError>;
}

/// Opens one submitter per worker, bound to the worker's endpoint.
#[cfg_attr(test, mockall::automock)]
pub trait SubmitterFactory: Send + Sync {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn TransactionSubmitter>, RpcError>;
}

impl TransactionSigner for Account {
    fn address(&self) -> Address {
        Account::address(self)
    }

    fn sign_transaction(&self, tx: &mut Transaction) -> Result<(), SignError> {
        Account::sign_transaction(self, tx)
    }
}
