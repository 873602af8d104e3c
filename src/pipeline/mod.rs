//! Pipeline orchestration: per-file stage coordination and the worker loop.

mod coordinator;
mod stats;
mod worker;

pub use coordinator::PipelineCoordinator;
pub use stats::RunStats;
pub use worker::{FileOutcome, Worker};
