//! File discovery: directory scans, filesystem events, and the backlog.

mod backlog;
mod queue;

pub use backlog::Backlog;
pub use queue::{scan_files, IngestQueue, Rescan, WatchSignal};
