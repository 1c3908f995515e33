use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use txbench_sdk::{SignError, Transaction};

use crate::core::client::{TransactionSigner, TransactionSubmitter};
use crate::types::{IterationOutcome, WorkerAssignment, WorkerReport};
use crate::worker::rate_limiter::RateLimiter;
use crate::worker::recorder::{EmissionLog, RecorderError};

#[derive(Error, Debug)]
pub enum WorkerError {
    /// Fatal for the whole run: the signer cannot be trusted anymore.
    #[error("Worker {worker} failed to sign nonce {nonce}: {source}")]
    Sign {
        worker: u32,
        nonce: u32,
        #[source]
        source: SignError,
    },
    #[error("Worker {worker} output failed: {source}")]
    Recorder {
        worker: u32,
        #[source]
        source: RecorderError,
    },
}

impl WorkerError {
    pub fn worker(&self) -> u32 {
        match self {
            WorkerError::Sign { worker, .. } | WorkerError::Recorder { worker, .. } => *worker,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::Sign { .. })
    }
}

/// Everything one worker owns or borrows for the duration of a run.
pub struct WorkerContext {
    pub assignment: WorkerAssignment,
    pub template: Arc<Transaction>,
    pub signer: Arc<dyn TransactionSigner>,
    /// `None` signs without sending.
    pub submitter: Option<Arc<dyn TransactionSubmitter>>,
    /// Directory of the worker's output file, `None` to skip persistence.
    pub output_dir: Option<PathBuf>,
    pub submit_timeout: Duration,
    pub cancel: CancellationToken,
}

/// Emits the assignment's transactions, one nonce per iteration.
///
/// Submission failures and timeouts consume their nonce and the loop moves on. A signing failure cancels `cancel`
/// for every worker of the run and is returned.
pub async fn run_worker(ctx: WorkerContext) -> Result<WorkerReport, WorkerError> {
    let WorkerContext { assignment, template, signer, submitter, output_dir, submit_timeout, cancel } = ctx;
    let worker = assignment.worker_index;
    let started = Instant::now();
    let mut report = WorkerReport::new(worker, &assignment.endpoint, assignment.nonce_range_start);

    let mut log = match output_dir {
        Some(dir) => Some(EmissionLog::open(&dir, worker).map_err(|source| WorkerError::Recorder { worker, source })?),
        None => None,
    };
    let mut limiter = RateLimiter::new(assignment.rate_per_second);
    let mut nonces = assignment.nonces();

    debug!(
        first_nonce = assignment.nonce_range_start,
        count = assignment.transaction_count,
        rate = assignment.rate_per_second,
        "Worker started"
    );

    while let Some(nonce) = nonces.next() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let mut tx = template.as_ref().clone();
        tx.set_nonce(nonce);
        if let Err(source) = signer.sign_transaction(&mut tx) {
            cancel.cancel();
            return Err(WorkerError::Sign { worker, nonce, source });
        }

        let outcome = match &submitter {
            Some(submitter) => {
                let outcome = submit(submitter.as_ref(), &tx, submit_timeout).await;
                match &outcome {
                    IterationOutcome::Submitted(hash) => debug!(nonce, %hash, "Transaction sent"),
                    IterationOutcome::Rejected(err) => warn!(nonce, error = %err, "Failed to send transaction"),
                    IterationOutcome::TimedOut => {
                        warn!(nonce, timeout_ms = submit_timeout.as_millis() as u64, "Transaction send timed out")
                    }
                    IterationOutcome::Signed => {}
                }
                if let Some(pause) = limiter.record_send() {
                    debug!(pause_ms = pause.as_millis() as u64, "Ahead of schedule");
                    tokio::select! {
                        _ = tokio::time::sleep(pause) => {}
                        _ = cancel.cancelled() => {}
                    }
                }
                outcome
            }
            None => IterationOutcome::Signed,
        };
        report.record(&outcome);
        report.next_nonce = nonces.peek();

        if let Some(log) = log.as_mut() {
            log.append(&tx).map_err(|source| WorkerError::Recorder { worker, source })?;
            report.recorded += 1;
        }
    }

    if let Some(log) = log {
        log.finish().map_err(|source| WorkerError::Recorder { worker, source })?;
    }
    report.elapsed = started.elapsed();

    info!(
        signed = report.signed,
        submitted = report.submitted,
        failed = report.failed,
        timed_out = report.timed_out,
        recorded = report.recorded,
        elapsed_ms = report.elapsed.as_millis() as u64,
        cancelled = report.cancelled,
        "Worker finished"
    );
    Ok(report)
}

async fn submit(submitter: &dyn TransactionSubmitter, tx: &Transaction, deadline: Duration) -> IterationOutcome {
    match tokio::time::timeout(deadline, submitter.send_transaction(tx)).await {
        Ok(Ok(hash)) => IterationOutcome::Submitted(hash),
        Ok(Err(err)) => IterationOutcome::Rejected(err),
        Err(_) => IterationOutcome::TimedOut,
    }
}
