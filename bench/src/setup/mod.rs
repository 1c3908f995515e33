//! Administrative commands run against the first configured endpoint, and the shared wallet/client setup of every
//! command.

pub mod balance;
pub mod contract;

use txbench_sdk::{Account, RpcClient, Wallet};

use crate::config::{BenchConfig, ConfigError};
use crate::error::BenchResult;

pub use balance::balance_of;
pub use contract::{deploy_contract, DeployedContract};

/// Unlocks the wallet's default account. `password` overrides the configured one.
pub fn load_account(config: &BenchConfig, password: Option<&str>) -> BenchResult<Account> {
    let wallet = Wallet::open(&config.wallet)?;
    let account = wallet.default_account(password.unwrap_or(&config.password))?;
    tracing::info!(label = account.label(), address = %account.address(), "Loaded signing account");
    Ok(account)
}

/// Client for the first configured endpoint.
pub fn first_endpoint_client(config: &BenchConfig) -> BenchResult<RpcClient> {
    let endpoint = config.rpc.first().ok_or(ConfigError::NoEndpoints)?;
    Ok(RpcClient::new(endpoint, config.submit_timeout())?)
}
