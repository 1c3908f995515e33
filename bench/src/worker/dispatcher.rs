use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use txbench_sdk::{RpcError, Transaction};

use crate::core::client::{SubmitterFactory, TransactionSigner};
use crate::types::{RunPlan, RunReport, WorkerAbort};
use crate::worker::emitter::{run_worker, WorkerContext, WorkerError};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to connect worker {worker} to {endpoint}: {source}")]
    Connect {
        worker: u32,
        endpoint: String,
        #[source]
        source: RpcError,
    },
    #[error("Run cancelled: {0}")]
    Fatal(#[source] WorkerError),
    #[error("Worker task failed: {0}")]
    Panicked(String),
}

/// Runs one worker per assignment of a [`RunPlan`] and waits for all of them.
pub struct Dispatcher {
    plan: RunPlan,
    template: Arc<Transaction>,
    signer: Arc<dyn TransactionSigner>,
    submitters: Arc<dyn SubmitterFactory>,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(
        plan: RunPlan,
        template: Transaction,
        signer: Arc<dyn TransactionSigner>,
        submitters: Arc<dyn SubmitterFactory>,
    ) -> Self {
        Self { plan, template: Arc::new(template), signer, submitters, cancel: CancellationToken::new() }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    /// Token stopping every worker at its next iteration boundary when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawns the workers and blocks until every one of them has completed.
    ///
    /// Connection failures happen before anything is spawned. A signing failure in any worker cancels the others
    /// and is returned once all of them have stopped. Output failures only stop the worker concerned and are listed
    /// in [`RunReport::aborted`].
    pub async fn run(&self) -> Result<RunReport, DispatchError> {
        let plan = &self.plan;
        if plan.dropped_transactions() > 0 {
            warn!(
                dropped = plan.dropped_transactions(),
                workers = plan.worker_count,
                "Transaction count is not a multiple of the worker count, the remainder is not sent"
            );
        }

        let assignments = plan.assignments();
        let mut submitters = Vec::with_capacity(assignments.len());
        for assignment in &assignments {
            let submitter = if plan.submit_output {
                let submitter = self.submitters.connect(&assignment.endpoint).map_err(|source| DispatchError::Connect {
                    worker: assignment.worker_index,
                    endpoint: assignment.endpoint.clone(),
                    source,
                })?;
                Some(submitter)
            } else {
                None
            };
            submitters.push(submitter);
        }

        info!(
            workers = plan.worker_count,
            total = plan.total_transactions,
            per_worker = plan.transactions_per_worker(),
            rate_per_worker = plan.rate_per_worker(),
            send = plan.submit_output,
            save = plan.persist_output,
            "Starting run"
        );

        let cancel = self.cancel.clone();
        let started = Instant::now();
        let mut worker_set = JoinSet::new();
        for (assignment, submitter) in assignments.into_iter().zip(submitters) {
            let worker = assignment.worker_index;
            let span = info_span!("worker", worker = worker, endpoint = %assignment.endpoint);
            let ctx = WorkerContext {
                assignment,
                template: self.template.clone(),
                signer: self.signer.clone(),
                submitter,
                output_dir: plan.persist_output.then(|| plan.output_dir.clone()),
                submit_timeout: plan.submit_timeout,
                cancel: cancel.clone(),
            };
            worker_set.spawn(async move { (worker, run_worker(ctx).await) }.instrument(span));
        }

        let mut workers = Vec::with_capacity(plan.worker_count as usize);
        let mut aborted = Vec::new();
        let mut fatal = None;
        while let Some(joined) = worker_set.join_next().await {
            match joined {
                Ok((_, Ok(report))) => workers.push(report),
                Ok((worker, Err(err))) if err.is_fatal() => {
                    error!(worker, error = %err, "Fatal worker error, cancelling run");
                    fatal.get_or_insert(DispatchError::Fatal(err));
                }
                Ok((worker, Err(err))) => {
                    error!(worker, error = %err, "Worker aborted");
                    aborted.push(WorkerAbort { worker, reason: err.to_string() });
                }
                Err(join_error) => {
                    cancel.cancel();
                    error!(error = %join_error, "Worker task failed");
                    fatal.get_or_insert(DispatchError::Panicked(join_error.to_string()));
                }
            }
        }

        if let Some(err) = fatal {
            return Err(err);
        }

        workers.sort_by_key(|report| report.worker);
        aborted.sort_by_key(|abort| abort.worker);
        Ok(RunReport { total_transactions: plan.total_transactions, elapsed: started.elapsed(), workers, aborted })
    }
}
