//! File routing: report placement and relocation out of the watched tree.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{PipelineError, RelocationError};
use crate::types::{ServiceConfig, StatsReport};
use crate::{FAILED_DIR, PROCESSED_DIR, REPORT_SUFFIX};

/// Where a source file ends up after its pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Processed,
    Failed,
}

impl Destination {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Destination::Processed => PROCESSED_DIR,
            Destination::Failed => FAILED_DIR,
        }
    }

    /// A later failure at the same path supersedes the earlier failed copy;
    /// a processed copy is never overwritten.
    pub fn replaces_existing(&self) -> bool {
        matches!(self, Destination::Failed)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Maps input paths to their report and archive locations and moves files.
///
/// This is the only component that writes to the filesystem.
#[derive(Debug, Clone)]
pub struct FileRouter {
    input_root: PathBuf,
    output_root: PathBuf,
    archive_root: PathBuf,
}

impl FileRouter {
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        archive_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            archive_root: archive_root.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(
            &config.input_path,
            &config.output_path,
            config.archive_root(),
        )
    }

    /// Path of `source` relative to the input root.
    pub fn relative_path<'a>(&self, source: &'a Path) -> Result<&'a Path, RelocationError> {
        source
            .strip_prefix(&self.input_root)
            .map_err(|_| RelocationError::NotUnderRoot {
                path: source.to_path_buf(),
                root: self.input_root.clone(),
            })
    }

    /// Archive location `source` would be moved to.
    pub fn destination_path(
        &self,
        source: &Path,
        destination: Destination,
    ) -> Result<PathBuf, RelocationError> {
        let relative = self.relative_path(source)?;
        Ok(self.archive_root.join(destination.dir_name()).join(relative))
    }

    /// Whether a previous run already archived this path as processed.
    pub fn already_processed(&self, source: &Path) -> bool {
        self.destination_path(source, Destination::Processed)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// `<output>/<subfolder>/<relative-path>_stats.txt`
    pub fn report_path(&self, source: &Path, subfolder: &str) -> Result<PathBuf, RelocationError> {
        let relative = self.relative_path(source)?;
        let mut path = self.output_root.join(subfolder).join(relative).into_os_string();
        path.push(REPORT_SUFFIX);
        Ok(PathBuf::from(path))
    }

    /// Write the report for `source` under its language subfolder.
    pub fn write_report(&self, source: &Path, report: &StatsReport) -> Result<PathBuf, PipelineError> {
        let path = self
            .report_path(source, &report.subfolder)
            .map_err(PipelineError::write)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::write(format!("creating {}: {}", parent.display(), e))
            })?;
        }

        info!(path = %path.display(), "Writing report");
        fs::write(&path, report.render())
            .map_err(|e| PipelineError::write(format!("writing {}: {}", path.display(), e)))?;

        Ok(path)
    }

    /// Move `source` into the processed or failed tree.
    ///
    /// An existing `failed/` copy is replaced; an existing `processed/` copy
    /// makes the move fail. On failure the source is left where it is and the error is logged;
    /// the next scan will pick it up again.
    pub fn route(&self, source: &Path, destination: Destination) -> Result<PathBuf, RelocationError> {
        let archive = self.archive_root.join(destination.dir_name());
        match relocate(source, &self.input_root, &archive, destination.replaces_existing()) {
            Ok(moved_to) => {
                info!(
                    source = %source.display(),
                    destination = %moved_to.display(),
                    outcome = %destination,
                    "Original file moved"
                );
                Ok(moved_to)
            }
            Err(e) => {
                warn!(source = %source.display(), outcome = %destination, error = %e, "Can't move file");
                Err(e)
            }
        }
    }
}

/// Move `source` to the same relative location under `destination_root`,
/// then delete directories it leaves empty up to (excluding) `input_root`.
///
/// Unless `replace_existing` is set, an existing destination is an error.
pub fn relocate(
    source: &Path,
    input_root: &Path,
    destination_root: &Path,
    replace_existing: bool,
) -> Result<PathBuf, RelocationError> {
    let relative = source
        .strip_prefix(input_root)
        .map_err(|_| RelocationError::NotUnderRoot {
            path: source.to_path_buf(),
            root: input_root.to_path_buf(),
        })?;
    let dest = destination_root.join(relative);

    if dest.exists() && !replace_existing {
        return Err(RelocationError::DestinationExists(dest));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|source| RelocationError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::rename(source, &dest).map_err(|e| RelocationError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;

    prune_empty_parents(source, input_root);
    Ok(dest)
}

/// Remove now-empty ancestors of `path`, stopping at `root` or the first
/// directory that still has entries.
pub fn prune_empty_parents(path: &Path, root: &Path) {
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        if fs::remove_dir(dir).is_err() {
            break;
        }
        debug!(dir = %dir.display(), "Removed empty directory");
        current = dir.parent();
    }
}
