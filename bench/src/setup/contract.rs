use std::path::Path;

use anyhow::Context;
use tracing::{info, instrument};
use txbench_sdk::{Account, Address, DeployMetadata, RpcClient, Transaction, TxHash};

use crate::config::{DEFAULT_DEPLOY_GAS_LIMIT, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE};

pub const INIT_METHOD: &str = "init";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub deploy_hash: TxHash,
    pub init_hash: TxHash,
}

fn token_metadata() -> DeployMetadata {
    DeployMetadata {
        name: "MYT".to_string(),
        version: "1.0".to_string(),
        author: "my".to_string(),
        email: "1@1.com".to_string(),
        description: "test".to_string(),
    }
}

/// Deploys the token contract whose hex encoded code is stored at `code_path`, then calls its `init` method.
///
/// Both transactions are paid by `account`. Their nonces are taken from the wall clock so repeated bootstraps never
/// reuse one.
#[instrument(skip(client, account), fields(payer = %account.address()))]
pub async fn deploy_contract(client: &RpcClient, account: &Account, code_path: &Path) -> anyhow::Result<DeployedContract> {
    let code_hex = std::fs::read_to_string(code_path)
        .with_context(|| format!("Failed to read contract code from {}", code_path.display()))?;
    let code = hex::decode(code_hex.trim())
        .with_context(|| format!("Contract code at {} is not valid hex", code_path.display()))?;
    let address = Address::from_code(&code);
    let nonce = chrono::Utc::now().timestamp() as u32;

    let mut deploy = Transaction::new_deploy(DEFAULT_GAS_PRICE, DEFAULT_DEPLOY_GAS_LIMIT, code, token_metadata());
    deploy.set_nonce(nonce);
    account.sign_transaction(&mut deploy).context("Failed to sign deploy transaction")?;
    let deploy_hash = client.send_transaction(&deploy).await.context("Failed to send deploy transaction")?;
    info!(hash = %deploy_hash, contract = %address, "Contract deployed");

    let mut init = Transaction::new_invoke(DEFAULT_GAS_PRICE, DEFAULT_GAS_LIMIT, address, INIT_METHOD, vec![]);
    init.set_nonce(nonce.wrapping_add(1));
    account.sign_transaction(&mut init).context("Failed to sign init transaction")?;
    let init_hash = client.send_transaction(&init).await.context("Failed to send init transaction")?;
    info!(hash = %init_hash, contract = %address, "Contract initialized");

    Ok(DeployedContract { address, deploy_hash, init_hash })
}
