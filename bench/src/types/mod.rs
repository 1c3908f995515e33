pub mod plan;
pub mod report;

pub use plan::{PlanError, RunPlan, WorkerAssignment};
pub use report::{IterationOutcome, RunReport, WorkerAbort, WorkerReport};
