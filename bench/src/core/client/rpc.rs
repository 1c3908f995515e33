use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use txbench_sdk::{RpcClient, RpcError, Transaction, TxHash};

use super::{SubmitterFactory, TransactionSubmitter};

#[async_trait]
impl TransactionSubmitter for RpcClient {
    fn endpoint(&self) -> String {
        RpcClient::endpoint(self).to_string()
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<TxHash, RpcError> {
        RpcClient::send_transaction(self, tx).await
    }
}

/// Connects each worker to its node over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcSubmitterFactory {
    request_timeout: Duration,
}

impl RpcSubmitterFactory {
    /// `request_timeout` bounds every HTTP request, independently of the engine's own submission deadline.
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

impl SubmitterFactory for RpcSubmitterFactory {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn TransactionSubmitter>, RpcError> {
        Ok(Arc::new(RpcClient::new(endpoint, self.request_timeout)?))
    }
}
