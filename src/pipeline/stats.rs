//! Counters for a worker run.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::info;

use super::worker::FileOutcome;
use crate::ingest::Rescan;

/// What a worker has done since it started.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub processed: usize,
    /// Subset of `processed` filed under "ambiguous"
    pub ambiguous: usize,
    pub failed: usize,
    /// Files whose relocation failed and that stay in the input tree
    pub left_in_place: usize,
    /// Files that disappeared before they could be read
    pub vanished: usize,
    pub rescans: usize,
    pub overflows: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            processed: 0,
            ambiguous: 0,
            failed: 0,
            left_in_place: 0,
            vanished: 0,
            rescans: 0,
            overflows: 0,
        }
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Processed { ambiguous, .. } => {
                self.processed += 1;
                if *ambiguous {
                    self.ambiguous += 1;
                }
            }
            FileOutcome::Failed { .. } => self.failed += 1,
            FileOutcome::LeftInPlace { .. } => self.left_in_place += 1,
            FileOutcome::Vanished => self.vanished += 1,
        }
    }

    pub fn record_rescan(&mut self, rescan: &Rescan) {
        self.rescans += 1;
        if rescan.overflow {
            self.overflows += 1;
        }
    }

    /// Files handled, whatever the outcome.
    pub fn total(&self) -> usize {
        self.processed + self.failed + self.left_in_place + self.vanished
    }

    pub fn uptime(&self) -> Duration {
        Utc::now() - self.started_at
    }

    pub fn log_summary(&self) {
        info!(
            uptime_secs = self.uptime().num_seconds(),
            processed = self.processed,
            ambiguous = self.ambiguous,
            failed = self.failed,
            left_in_place = self.left_in_place,
            vanished = self.vanished,
            rescans = self.rescans,
            overflows = self.overflows,
            "Run summary"
        );
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
