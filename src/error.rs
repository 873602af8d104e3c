//! Error types for configuration, the processing pipeline, and relocation.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup errors. Any of these stops the service before it starts watching.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("confidence threshold must be within [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("invalid setting `{field}`: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("input directory does not exist: {0}")]
    MissingInput(PathBuf),

    #[error("{field} ({path}) must not be located inside the input directory")]
    NestedInInput { field: &'static str, path: PathBuf },

    #[error("failed to read exclusion list {path}: {source}")]
    ExclusionList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load language profiles: {0}")]
    Profiles(#[from] ProfileError),
}

/// Errors raised while loading language profile data.
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed profile {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no language profiles found in {0}")]
    Empty(PathBuf),

    #[error("duplicate profile for language `{0}`")]
    Duplicate(String),
}

/// Reasons the detector could not rank a text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassificationError {
    #[error("text contains no usable n-grams")]
    NoFeatures,

    #[error("no language reached the reporting floor")]
    NoCandidates,
}

/// Content the tokenizer refuses to count.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizationError {
    #[error("content contains NUL characters at offset {0}")]
    BinaryContent(usize),
}

/// The stage of the pipeline an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Read,
    Classify,
    Tokenize,
    Write,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Read => write!(f, "read"),
            PipelineStage::Classify => write!(f, "classify"),
            PipelineStage::Tokenize => write!(f, "tokenize"),
            PipelineStage::Write => write!(f, "write"),
        }
    }
}

/// Underlying cause of a pipeline failure.
#[derive(Error, Debug)]
pub enum FailureKind {
    #[error("read failure: {0}")]
    ReadFailure(String),

    #[error("classification error: {0}")]
    ClassificationError(#[from] ClassificationError),

    #[error("tokenization error: {0}")]
    TokenizationError(#[from] TokenizationError),

    #[error("write failure: {0}")]
    WriteFailure(String),
}

/// A failure tagged with the stage it happened in.
///
/// The worker converts every `PipelineError` into a move to `failed/`.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {kind}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub kind: FailureKind,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, kind: FailureKind) -> Self {
        Self { stage, kind }
    }

    pub fn read(cause: impl fmt::Display) -> Self {
        Self::new(PipelineStage::Read, FailureKind::ReadFailure(cause.to_string()))
    }

    pub fn write(cause: impl fmt::Display) -> Self {
        Self::new(PipelineStage::Write, FailureKind::WriteFailure(cause.to_string()))
    }
}

/// Errors from moving a file out of the watched tree.
#[derive(Error, Debug)]
pub enum RelocationError {
    #[error("{path} is not under {root}")]
    NotUnderRoot { path: PathBuf, root: PathBuf },

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("I/O error relocating {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors setting up the filesystem watch.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_display_includes_stage() {
        let err = PipelineError::new(
            PipelineStage::Classify,
            FailureKind::ClassificationError(ClassificationError::NoFeatures),
        );
        assert_eq!(
            err.to_string(),
            "classify stage failed: classification error: text contains no usable n-grams"
        );
    }

    #[test]
    fn test_read_helper() {
        let err = PipelineError::read("gone");
        assert_eq!(err.stage, PipelineStage::Read);
        assert!(matches!(err.kind, FailureKind::ReadFailure(ref m) if m == "gone"));
    }
}
