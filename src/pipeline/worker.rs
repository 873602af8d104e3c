//! Poll loop: drain watch events, dequeue one file, run it, route it.

use std::fs;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::coordinator::PipelineCoordinator;
use super::stats::RunStats;
use crate::error::PipelineError;
use crate::ingest::IngestQueue;
use crate::router::{Destination, FileRouter};
use crate::types::WorkItem;

/// What happened to one dequeued file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Report written and source moved to `processed/`.
    Processed {
        report: PathBuf,
        archived: PathBuf,
        ambiguous: bool,
    },
    /// Source moved to `failed/`.
    Failed { reason: String, archived: PathBuf },
    /// The move out of the input tree failed; the file stays for a later scan.
    LeftInPlace { reason: String },
    /// The file disappeared between discovery and reading.
    Vanished,
}

/// Single logical worker over a shared backlog.
pub struct Worker {
    queue: IngestQueue,
    coordinator: PipelineCoordinator,
    router: FileRouter,
    stats: RunStats,
    idle_delay: Duration,
}

impl Worker {
    pub fn new(
        queue: IngestQueue,
        coordinator: PipelineCoordinator,
        router: FileRouter,
        idle_delay: Duration,
    ) -> Self {
        Self {
            queue,
            coordinator,
            router,
            stats: RunStats::new(),
            idle_delay,
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn queue(&self) -> &IngestQueue {
        &self.queue
    }

    /// Absorb pending watch events, then handle the next file if there is one.
    ///
    /// Returns `None` when the backlog was empty.
    pub fn step(&mut self) -> Option<FileOutcome> {
        if let Some(rescan) = self.queue.drain_events() {
            self.stats.record_rescan(&rescan);
        }

        let path = self.queue.next_file()?;
        let outcome = self.handle(&path);
        self.queue.complete(&path);
        self.stats.record(&outcome);
        Some(outcome)
    }

    /// Run until `shutdown` resolves. Shutdown is only observed between files.
    pub async fn run<F>(mut self, shutdown: F) -> RunStats
    where
        F: Future<Output = ()>,
    {
        info!(
            root = %self.queue.root().display(),
            classifier = self.coordinator.classifier().name(),
            "Worker started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping worker");
                    break;
                }
                _ = self.tick() => {}
            }
        }

        self.stats
    }

    async fn tick(&mut self) {
        if self.step().is_some() {
            tokio::task::yield_now().await;
            return;
        }
        debug!(delay_ms = self.idle_delay.as_millis() as u64, "Backlog empty, waiting");
        if let Some(rescan) = self.queue.wait_for_event(self.idle_delay).await {
            self.stats.record_rescan(&rescan);
        }
    }

    fn handle(&self, path: &Path) -> FileOutcome {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "File vanished before it could be read");
                return FileOutcome::Vanished;
            }
            Err(e) => return self.fail(path, PipelineError::read(e).to_string()),
        };

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(e) => return self.fail(path, PipelineError::read(e).to_string()),
        };

        if content.is_empty() {
            return self.fail(path, "empty file".to_string());
        }
        if self.router.already_processed(path) {
            return self.fail(path, "already present under processed".to_string());
        }

        let item = WorkItem::new(path.to_path_buf(), content);
        let result = self
            .coordinator
            .process(&item)
            .and_then(|report| {
                let written = self.router.write_report(path, &report)?;
                Ok((written, report.is_ambiguous()))
            });

        match result {
            Ok((report, ambiguous)) => match self.router.route(path, Destination::Processed) {
                Ok(archived) => FileOutcome::Processed {
                    report,
                    archived,
                    ambiguous,
                },
                Err(e) => FileOutcome::LeftInPlace {
                    reason: e.to_string(),
                },
            },
            Err(e) => {
                error!(path = %path.display(), stage = %e.stage, error = %e.kind, "Pipeline failed");
                self.fail(path, e.to_string())
            }
        }
    }

    fn fail(&self, path: &Path, reason: String) -> FileOutcome {
        warn!(path = %path.display(), reason = %reason, "Routing file to failed");
        match self.router.route(path, Destination::Failed) {
            Ok(archived) => FileOutcome::Failed { reason, archived },
            Err(e) => FileOutcome::LeftInPlace {
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassificationError;
    use crate::ingest::Backlog;
    use crate::processing::{LanguageClassifier, StatsFormatter, TokenFilter, Tokenizer};
    use crate::types::LanguageRanking;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct English;

    impl LanguageClassifier for English {
        fn name(&self) -> &'static str {
            "english"
        }

        fn classify(&self, _text: &str) -> Result<LanguageRanking, ClassificationError> {
            Ok([("en", 0.95)].into_iter().collect())
        }
    }

    fn worker(dir: &TempDir) -> (Worker, PathBuf, PathBuf) {
        let input = dir.path().join("input");
        let output = dir.path().join("output");
        fs::create_dir_all(&input).unwrap();

        let queue = IngestQueue::new(&input, Arc::new(Backlog::new()));
        let coordinator = PipelineCoordinator::new(
            Arc::new(English),
            Tokenizer::new(Arc::new(TokenFilter::new(["."]))),
            StatsFormatter::default(),
        );
        let router = FileRouter::new(&input, &output, &output);
        let worker = Worker::new(queue, coordinator, router, Duration::from_millis(10));
        (worker, input, output)
    }

    #[test]
    fn test_step_on_empty_backlog() {
        let dir = TempDir::new().unwrap();
        let (mut worker, _, _) = worker(&dir);
        assert_eq!(worker.step(), None);
    }

    #[test]
    fn test_step_processes_and_completes() {
        let dir = TempDir::new().unwrap();
        let (mut worker, input, output) = worker(&dir);
        fs::write(input.join("doc.txt"), "hello world.").unwrap();
        worker.queue().rescan_append();

        let outcome = worker.step().unwrap();

        assert_eq!(
            outcome,
            FileOutcome::Processed {
                report: output.join("en/doc.txt_stats.txt"),
                archived: output.join("processed/doc.txt"),
                ambiguous: false,
            }
        );
        assert_eq!(worker.queue().backlog().in_flight(), 0);
        assert_eq!(worker.stats().processed, 1);
    }

    #[test]
    fn test_vanished_file() {
        let dir = TempDir::new().unwrap();
        let (mut worker, input, _) = worker(&dir);
        let path = input.join("gone.txt");
        fs::write(&path, "x").unwrap();
        worker.queue().rescan_append();
        fs::remove_file(&path).unwrap();

        assert_eq!(worker.step(), Some(FileOutcome::Vanished));
        assert_eq!(worker.stats().vanished, 1);
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let dir = TempDir::new().unwrap();
        let (mut worker, input, output) = worker(&dir);
        fs::write(input.join("bin.dat"), [0xff, 0xfe, 0x00]).unwrap();
        worker.queue().rescan_append();

        match worker.step() {
            Some(FileOutcome::Failed { reason, archived }) => {
                assert!(reason.starts_with("read stage failed"));
                assert_eq!(archived, output.join("failed/bin.dat"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let (worker, input, output) = worker(&dir);
        fs::write(input.join("a.txt"), "one").unwrap();
        worker.queue().rescan_append();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let archived = output.join("processed/a.txt");
        let (stats, _) = tokio::join!(
            worker.run(async {
                let _ = rx.await;
            }),
            async {
                for _ in 0..100 {
                    if archived.exists() {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                let _ = tx.send(());
            }
        );

        assert_eq!(stats.processed, 1);
        assert!(output.join("en/a.txt_stats.txt").exists());
    }
}
