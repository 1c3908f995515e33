use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::{BenchConfig, DEFAULT_SUBMIT_TIMEOUT_MS};
use crate::worker::nonce::{NonceAllocator, NonceSequence};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanError {
    #[error("A run needs at least one worker")]
    NoWorkers,
    #[error("A run needs at least one rpc endpoint")]
    NoEndpoints,
    #[error("Nonces starting at {start_nonce} would reach {required}, past the 32 bit nonce space")]
    NonceOverflow { start_nonce: u32, required: u64 },
}

/// Everything the dispatcher needs to know about a run, derived once from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub total_transactions: u64,
    pub worker_count: u32,
    pub target_rate_per_second: u64,
    pub start_nonce: u32,
    pub rpc_endpoints: Vec<String>,
    pub persist_output: bool,
    pub submit_output: bool,
    pub submit_timeout: Duration,
    pub output_dir: PathBuf,
    allocator: NonceAllocator,
}

impl RunPlan {
    /// A plan submitting every transaction without rate limiting or persistence.
    ///
    /// `total_transactions` is clamped to `u32::MAX` before it is partitioned.
    pub fn new(
        total_transactions: u64,
        worker_count: u32,
        start_nonce: u32,
        rpc_endpoints: Vec<String>,
    ) -> Result<Self, PlanError> {
        if rpc_endpoints.is_empty() {
            return Err(PlanError::NoEndpoints);
        }
        let total_transactions = total_transactions.min(u64::from(u32::MAX));
        let allocator = NonceAllocator::new(total_transactions, worker_count, start_nonce)?;
        Ok(Self {
            total_transactions,
            worker_count,
            target_rate_per_second: 0,
            start_nonce,
            rpc_endpoints,
            persist_output: false,
            submit_output: true,
            submit_timeout: Duration::from_millis(DEFAULT_SUBMIT_TIMEOUT_MS),
            output_dir: PathBuf::from("."),
            allocator,
        })
    }

    pub fn from_config(config: &BenchConfig) -> Result<Self, PlanError> {
        Ok(Self::new(config.total_transactions(), config.routine_num, config.start_nonce, config.rpc.clone())?
            .with_rate(config.tps)
            .with_submission(config.send_tx)
            .with_persistence(config.save_tx.then(|| config.output_dir.clone()))
            .with_submit_timeout(config.submit_timeout()))
    }

    /// Aggregate target rate, `0` for unlimited.
    pub fn with_rate(mut self, rate_per_second: u64) -> Self {
        self.target_rate_per_second = rate_per_second;
        self
    }

    pub fn with_submission(mut self, submit: bool) -> Self {
        self.submit_output = submit;
        self
    }

    /// Writes per worker output files under `dir`, or nothing when `None`.
    pub fn with_persistence(mut self, dir: Option<PathBuf>) -> Self {
        self.persist_output = dir.is_some();
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }

    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    pub fn transactions_per_worker(&self) -> u64 {
        self.allocator.per_worker()
    }

    /// Per worker share of the target rate. Uneven division under-paces.
    pub fn rate_per_worker(&self) -> u64 {
        self.target_rate_per_second / u64::from(self.worker_count)
    }

    pub fn dropped_transactions(&self) -> u64 {
        self.allocator.dropped()
    }

    pub fn assignment(&self, worker_index: u32) -> WorkerAssignment {
        let endpoint = &self.rpc_endpoints[worker_index as usize % self.rpc_endpoints.len()];
        WorkerAssignment {
            worker_index,
            nonce_range_start: self.allocator.range_start(worker_index),
            transaction_count: self.allocator.per_worker(),
            endpoint: endpoint.clone(),
            rate_per_second: self.rate_per_worker(),
        }
    }

    pub fn assignments(&self) -> Vec<WorkerAssignment> {
        (0..self.worker_count).map(|worker| self.assignment(worker)).collect()
    }
}

/// One worker's share of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerAssignment {
    pub worker_index: u32,
    pub nonce_range_start: u32,
    pub transaction_count: u64,
    pub endpoint: String,
    pub rate_per_second: u64,
}

impl WorkerAssignment {
    pub fn nonces(&self) -> NonceSequence {
        NonceSequence::new(self.nonce_range_start, self.transaction_count)
    }
}
