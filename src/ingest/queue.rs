//! Directory scanning and filesystem watching feeding the backlog.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::backlog::Backlog;
use crate::error::WatchError;

/// Watch signals buffered before further events count as an overflow.
const WATCH_CHANNEL_CAPACITY: usize = 1024;

/// What the watch backend reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    /// A path appeared under the input root.
    Created(PathBuf),
    /// Events were dropped or coalesced; the backlog must be rebuilt.
    Overflow,
}

/// Result of absorbing a batch of watch signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rescan {
    /// The backlog was replaced rather than appended to.
    pub overflow: bool,
    /// Paths newly added to the backlog.
    pub enqueued: usize,
}

/// Watches the input tree and keeps the backlog filled in sorted order.
pub struct IngestQueue {
    root: PathBuf,
    backlog: Arc<Backlog>,
    events: Option<mpsc::Receiver<WatchSignal>>,
    /// Set by the watcher callback when a signal did not fit in the channel.
    dropped: Arc<AtomicBool>,
    watcher: Option<RecommendedWatcher>,
}

impl IngestQueue {
    /// Create a queue over `root` without scanning or watching.
    pub fn new(root: impl Into<PathBuf>, backlog: Arc<Backlog>) -> Self {
        Self {
            root: root.into(),
            backlog,
            events: None,
            dropped: Arc::new(AtomicBool::new(false)),
            watcher: None,
        }
    }

    /// Subscribe to creation events under `root`, then enqueue every file
    /// already present.
    ///
    /// The watch is recursive, so subdirectories created later are covered.
    pub fn start(root: impl Into<PathBuf>, backlog: Arc<Backlog>) -> Result<Self, WatchError> {
        let mut queue = Self::new(root, backlog);

        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let dropped = Arc::clone(&queue.dropped);
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                for signal in signals_from(result) {
                    match tx.try_send(signal) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            dropped.store(true, Ordering::SeqCst);
                            break;
                        }
                        Err(TrySendError::Closed(_)) => break,
                    }
                }
            },
            NotifyConfig::default(),
        )?;
        watcher.watch(&queue.root, RecursiveMode::Recursive)?;

        queue.watcher = Some(watcher);
        queue.events = Some(rx);

        let enqueued = queue.rescan_append();
        info!(root = %queue.root.display(), enqueued, "Watching input directory");
        Ok(queue)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backlog(&self) -> &Arc<Backlog> {
        &self.backlog
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// All regular files under the root, sorted byte-wise by full path.
    pub fn scan(&self) -> Vec<PathBuf> {
        scan_files(&self.root)
    }

    /// Full rescan, appending files not already queued or in flight.
    pub fn rescan_append(&self) -> usize {
        let enqueued = self.backlog.append(self.scan());
        if enqueued > 0 {
            info!(enqueued, "Files enqueued");
        }
        enqueued
    }

    /// Clear the backlog and rebuild it from a full rescan.
    pub fn rescan_replace(&self) -> usize {
        let enqueued = self.backlog.replace(self.scan());
        info!(enqueued, "Backlog rebuilt after overflow");
        enqueued
    }

    /// Take the next file, or `None` if the backlog is empty.
    pub fn next_file(&self) -> Option<PathBuf> {
        self.backlog.dequeue()
    }

    /// Mark a dequeued file as finished.
    pub fn complete(&self, path: &Path) {
        self.backlog.complete(path);
    }

    /// Absorb all pending watch signals without blocking.
    pub fn drain_events(&mut self) -> Option<Rescan> {
        self.absorb(Vec::new())
    }

    /// Wait up to `timeout` for a watch signal, then absorb it and any
    /// others already pending. Sleeps for `timeout` when not watching.
    pub async fn wait_for_event(&mut self, timeout: Duration) -> Option<Rescan> {
        let Some(events) = self.events.as_mut() else {
            tokio::time::sleep(timeout).await;
            return None;
        };

        let received = tokio::time::timeout(timeout, events.recv()).await;
        match received {
            Ok(Some(signal)) => self.absorb(vec![signal]),
            Ok(None) => {
                warn!("Watch channel closed; relying on existing backlog");
                self.events = None;
                None
            }
            Err(_) => None,
        }
    }

    /// One rescan per batch: replace on overflow, otherwise append.
    fn absorb(&mut self, mut signals: Vec<WatchSignal>) -> Option<Rescan> {
        if let Some(events) = self.events.as_mut() {
            loop {
                match events.try_recv() {
                    Ok(signal) => signals.push(signal),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        warn!("Watch channel closed; relying on existing backlog");
                        self.events = None;
                        break;
                    }
                }
            }
        }

        if self.dropped.swap(false, Ordering::SeqCst) {
            signals.push(WatchSignal::Overflow);
        }

        if signals.is_empty() {
            return None;
        }

        if signals.contains(&WatchSignal::Overflow) {
            warn!(root = %self.root.display(), "Input folder overflow");
            let enqueued = self.rescan_replace();
            return Some(Rescan {
                overflow: true,
                enqueued,
            });
        }

        for signal in &signals {
            if let WatchSignal::Created(path) = signal {
                debug!(path = %path.display(), "Creation event");
            }
        }
        Some(Rescan {
            overflow: false,
            enqueued: self.rescan_append(),
        })
    }
}

/// Translate a notify callback result into watch signals.
fn signals_from(result: notify::Result<Event>) -> Vec<WatchSignal> {
    let event = match result {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "File watcher error, forcing rescan");
            return vec![WatchSignal::Overflow];
        }
    };

    if event.need_rescan() {
        return vec![WatchSignal::Overflow];
    }

    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(WatchSignal::Created).collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Both | RenameMode::Any)) => event
            .paths
            .into_iter()
            .last()
            .map(WatchSignal::Created)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

/// Recursively list regular files under `root`, sorted by path bytes.
pub fn scan_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry during scan");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    files.sort_by(|a, b| {
        a.as_os_str()
            .as_encoded_bytes()
            .cmp(b.as_os_str().as_encoded_bytes())
    });
    files
}
