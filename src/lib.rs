//! Langwatch Service Library
//!
//! Watches a directory for text files, identifies each file's language,
//! counts its tokens, writes a statistics report, and moves the source
//! file into a `processed/` or `failed/` tree.

pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod processing;
pub mod router;
pub mod types;

pub use error::{ConfigError, PipelineError, PipelineStage, RelocationError};
pub use ingest::{Backlog, IngestQueue};
pub use pipeline::{PipelineCoordinator, RunStats, Worker};
pub use processing::{LanguageClassifier, ProfileClassifier, StatsFormatter, TokenFilter, Tokenizer};
pub use router::FileRouter;
pub use types::{LanguageRanking, ServiceConfig, StatsReport, TokenFrequency, WorkItem};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ingest::*;
    pub use crate::pipeline::*;
    pub use crate::processing::*;
    pub use crate::router::FileRouter;
    pub use crate::types::*;
}

/// Default watched directory
pub const DEFAULT_INPUT_PATH: &str = "/mm_disk/input";

/// Default report directory
pub const DEFAULT_OUTPUT_PATH: &str = "/mm_disk/output";

/// Default minimum probability for a confident language identification
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Default sleep when the backlog is empty (milliseconds)
pub const DEFAULT_IDLE_DELAY_MS: u64 = 2000;

/// Default number of ranked languages listed in a report
pub const DEFAULT_LANGUAGES_TO_SHOW: usize = 5;

/// Subfolder for reports whose top language is below the threshold
pub const AMBIGUOUS_SUBFOLDER: &str = "ambiguous";

/// Suffix appended to the relative path of a report
pub const REPORT_SUFFIX: &str = "_stats.txt";

/// Archive subdirectory for successfully processed inputs
pub const PROCESSED_DIR: &str = "processed";

/// Archive subdirectory for inputs that failed
pub const FAILED_DIR: &str = "failed";
