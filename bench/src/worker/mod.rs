pub mod dispatcher;
pub mod emitter;
pub mod nonce;
pub mod rate_limiter;
pub mod recorder;

use std::sync::Arc;

pub use dispatcher::{DispatchError, Dispatcher};
pub use emitter::{run_worker, WorkerContext, WorkerError};

use crate::config::BenchConfig;
use crate::core::client::{SubmitterFactory, TransactionSigner};
use crate::core::TransactionFactory;
use crate::error::BenchResult;
use crate::types::RunPlan;

/// Validates `config` for a benchmark run and wires a dispatcher around `signer`.
///
/// Everything that can make the run meaningless (bad config, bad addresses, wrapping nonces) fails here, before any
/// worker is spawned.
pub fn build_dispatcher(
    config: &BenchConfig,
    signer: Arc<dyn TransactionSigner>,
    submitters: Arc<dyn SubmitterFactory>,
) -> BenchResult<Dispatcher> {
    config.validate_run()?;
    let plan = RunPlan::from_config(config)?;
    let template = TransactionFactory::from_config(config)?.template(signer.address())?;
    Ok(Dispatcher::new(plan, template, signer, submitters))
}
