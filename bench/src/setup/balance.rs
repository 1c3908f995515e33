use anyhow::{anyhow, Context};
use num_bigint::BigInt;
use tracing::info;
use txbench_sdk::{Address, RpcClient, Transaction};

use crate::config::{DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE};

pub const BALANCE_OF_METHOD: &str = "balanceOf";

/// Token balance of `owner`, read by pre-executing the contract's `balanceOf` method.
pub async fn balance_of(client: &RpcClient, contract: Address, owner: Address) -> anyhow::Result<BigInt> {
    let query = Transaction::new_invoke(DEFAULT_GAS_PRICE, DEFAULT_GAS_LIMIT, contract, BALANCE_OF_METHOD, vec![owner.into()]);
    let result = client.pre_execute(&query).await.context("Failed to pre-execute balanceOf")?;
    let balance = result.as_integer().map_err(|reason| anyhow!("Unexpected balanceOf result {:?}: {reason}", result.result))?;
    info!(%contract, %owner, %balance, "Balance");
    Ok(balance)
}
