use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_GAS_PRICE: u64 = 0;
pub const DEFAULT_GAS_LIMIT: u64 = 20_000;
pub const DEFAULT_DEPLOY_GAS_LIMIT: u64 = 200_000_000;
pub const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 10_000;

/// Configuration validation error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("RoutineNum must be greater than zero")]
    NoWorkers,
    #[error("At least one Rpc endpoint is required")]
    NoEndpoints,
    #[error("Rpc endpoint `{0}` is not an absolute url")]
    InvalidEndpoint(String),
    #[error("Contract is required when Token is oep4")]
    MissingContract,
    #[error("ContractCodePath is required to deploy the contract")]
    MissingContractCode,
    #[error("TPS {tps} is lower than RoutineNum {workers}: every worker would be unthrottled")]
    RateBelowWorkerCount { tps: u64, workers: u32 },
    #[error("SubmitTimeoutMs must be greater than zero")]
    ZeroSubmitTimeout,
}

/// Asset the benchmark transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    Ont,
    Ong,
    /// Contract token moved through the contract's `transfer` method.
    #[default]
    Oep4,
}

fn default_tx_factor() -> u64 {
    1
}

fn default_gas_price() -> u64 {
    DEFAULT_GAS_PRICE
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_submit_timeout_ms() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT_MS
}

/// Run parameters, read once from a JSON file at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BenchConfig {
    pub wallet: PathBuf,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub contract_code_path: Option<PathBuf>,
    #[serde(default)]
    pub contract: Option<String>,
    pub to: String,
    #[serde(default)]
    pub amount: u64,
    pub rpc: Vec<String>,
    /// The total volume is `TxNum * TxFactor`.
    pub tx_num: u64,
    #[serde(default = "default_tx_factor")]
    pub tx_factor: u64,
    /// One worker, and one output file, per routine.
    pub routine_num: u32,
    #[serde(rename = "TPS", default)]
    pub tps: u64,
    #[serde(default)]
    pub start_nonce: u32,
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default)]
    pub save_tx: bool,
    #[serde(default)]
    pub send_tx: bool,
    #[serde(default)]
    pub token: Token,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
}

impl BenchConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse { path: PathBuf::from("<inline>"), source })
    }

    /// Checks the parameters every command relies on, including the bootstrap that creates the contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        for endpoint in &self.rpc {
            match Url::parse(endpoint) {
                Ok(url) if url.has_host() => {}
                _ => return Err(ConfigError::InvalidEndpoint(endpoint.clone())),
            }
        }
        if self.submit_timeout_ms == 0 {
            return Err(ConfigError::ZeroSubmitTimeout);
        }
        Ok(())
    }

    /// Checks the parameters of a benchmark run, on top of [`BenchConfig::validate`].
    pub fn validate_run(&self) -> Result<(), ConfigError> {
        self.validate()?;
        if self.routine_num == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.token == Token::Oep4 && self.contract.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(ConfigError::MissingContract);
        }
        if self.tps != 0 && self.tps < u64::from(self.routine_num) {
            return Err(ConfigError::RateBelowWorkerCount { tps: self.tps, workers: self.routine_num });
        }
        Ok(())
    }

    pub fn total_transactions(&self) -> u64 {
        self.tx_num.saturating_mul(self.tx_factor)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub fn contract_code_path(&self) -> Result<&Path, ConfigError> {
        self.contract_code_path.as_deref().ok_or(ConfigError::MissingContractCode)
    }
}
