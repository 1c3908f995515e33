use std::fmt;
use std::time::Duration;

use txbench_sdk::{RpcError, TxHash};

/// What happened to a single nonce.
#[derive(Debug)]
pub enum IterationOutcome {
    /// Signed but not sent (dry run).
    Signed,
    Submitted(TxHash),
    Rejected(RpcError),
    TimedOut,
}

/// Counters folded from one worker's iteration outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker: u32,
    pub endpoint: String,
    pub first_nonce: u32,
    /// Next nonce the worker would have used: one past the last consumed nonce.
    pub next_nonce: u64,
    pub signed: u64,
    pub submitted: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub recorded: u64,
    pub elapsed: Duration,
    /// Stopped early because another worker hit a fatal error.
    pub cancelled: bool,
}

impl WorkerReport {
    pub fn new(worker: u32, endpoint: impl Into<String>, first_nonce: u32) -> Self {
        Self {
            worker,
            endpoint: endpoint.into(),
            first_nonce,
            next_nonce: u64::from(first_nonce),
            signed: 0,
            submitted: 0,
            failed: 0,
            timed_out: 0,
            recorded: 0,
            elapsed: Duration::ZERO,
            cancelled: false,
        }
    }

    pub fn record(&mut self, outcome: &IterationOutcome) {
        self.signed += 1;
        match outcome {
            IterationOutcome::Signed => {}
            IterationOutcome::Submitted(_) => self.submitted += 1,
            IterationOutcome::Rejected(_) => self.failed += 1,
            IterationOutcome::TimedOut => self.timed_out += 1,
        }
    }

    /// Nonces consumed, whatever their outcome.
    pub fn consumed(&self) -> u64 {
        self.next_nonce - u64::from(self.first_nonce)
    }
}

/// A worker stopped by a failure that only concerns itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerAbort {
    pub worker: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub total_transactions: u64,
    pub elapsed: Duration,
    pub workers: Vec<WorkerReport>,
    pub aborted: Vec<WorkerAbort>,
}

impl RunReport {
    /// Throughput over the intended volume, `total * 1000 / elapsed_ms`. Skipped or failed transactions still count.
    pub fn tps(&self) -> u64 {
        let elapsed_ms = u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX).max(1);
        self.total_transactions.saturating_mul(1000) / elapsed_ms
    }

    pub fn emitted(&self) -> u64 {
        self.workers.iter().map(|w| w.signed).sum()
    }

    pub fn submitted(&self) -> u64 {
        self.workers.iter().map(|w| w.submitted).sum()
    }

    pub fn failed(&self) -> u64 {
        self.workers.iter().map(|w| w.failed + w.timed_out).sum()
    }

    pub fn recorded(&self) -> u64 {
        self.workers.iter().map(|w| w.recorded).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.aborted.is_empty() && self.workers.iter().all(|w| !w.cancelled)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tx in {} ms ({} tps): emitted={} submitted={} failed={} recorded={} aborted_workers={}",
            self.total_transactions,
            self.elapsed.as_millis(),
            self.tps(),
            self.emitted(),
            self.submitted(),
            self.failed(),
            self.recorded(),
            self.aborted.len()
        )
    }
}
