//! Ordered, duplicate-free queue of discovered files.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct BacklogState {
    queue: VecDeque<PathBuf>,
    queued: HashSet<PathBuf>,
    /// Dequeued but not yet completed.
    in_flight: HashSet<PathBuf>,
}

impl BacklogState {
    fn push(&mut self, path: PathBuf) -> bool {
        if self.queued.contains(&path) || self.in_flight.contains(&path) {
            return false;
        }
        self.queued.insert(path.clone());
        self.queue.push_back(path);
        true
    }
}

/// Shared work queue of discovered, not-yet-processed paths.
///
/// A path is either queued once, in flight once, or absent. Enqueues from
/// rescans and dequeues from workers are serialized by one lock.
#[derive(Debug, Default)]
pub struct Backlog {
    state: Mutex<BacklogState>,
}

impl Backlog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The backlog holds plain data, so a poisoned lock is still consistent.
    fn lock(&self) -> MutexGuard<'_, BacklogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append paths in the given order, skipping any already queued or in
    /// flight. Returns how many were added.
    pub fn append<I>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut state = self.lock();
        paths.into_iter().filter(|p| state.push(p.clone())).count()
    }

    /// Drop everything queued and enqueue `paths` instead.
    ///
    /// In-flight paths are kept and still skipped.
    pub fn replace<I>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut state = self.lock();
        state.queue.clear();
        state.queued.clear();
        paths.into_iter().filter(|p| state.push(p.clone())).count()
    }

    /// Take the head of the queue and mark it in flight.
    pub fn dequeue(&self) -> Option<PathBuf> {
        let mut state = self.lock();
        let path = state.queue.pop_front()?;
        state.queued.remove(&path);
        state.in_flight.insert(path.clone());
        Some(path)
    }

    /// Release an in-flight path so later scans may enqueue it again.
    pub fn complete(&self, path: &Path) -> bool {
        self.lock().in_flight.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        let state = self.lock();
        state.queued.contains(path) || state.in_flight.contains(path)
    }

    /// Number of queued (not in-flight) paths.
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Queued paths in dequeue order.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.lock().queue.iter().cloned().collect()
    }
}
