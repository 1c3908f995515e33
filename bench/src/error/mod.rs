use thiserror::Error;
use txbench_sdk::{RpcError, WalletError};

use crate::config::ConfigError;
use crate::core::FactoryError;
use crate::types::PlanError;
use crate::worker::DispatchError;

/// Result type for benchmark operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Error types for the benchmark client
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Invalid run plan: {0}")]
    Plan(#[from] PlanError),

    #[error("Failed to build transaction template: {0}")]
    Factory(#[from] FactoryError),

    #[error("Rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Run failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// Some workers stopped before their share was emitted
    #[error("{0} worker(s) aborted before completing")]
    WorkersAborted(usize),
}
