//! Result types for dataset runs

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use uuid::Uuid;

use crate::application::errors::PipelineError;

/// An archive that failed under the collecting failure policy
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: PipelineError,
}

/// What one worker did before it terminated
#[derive(Debug, Default)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub files_completed: usize,
    pub records_committed: usize,
    pub failures: Vec<FileFailure>,
}

impl WorkerReport {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Self::default()
        }
    }
}

/// Outcome of a complete dataset run
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Archives queued for the run
    pub files_total: usize,
    /// Archives whose batch was committed
    pub files_completed: usize,
    /// Entries written to the manifest
    pub records_emitted: usize,
    pub manifest_path: PathBuf,
    pub failures: Vec<FileFailure>,
}

impl RunSummary {
    /// Returns true if every archive was committed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns a one-line summary of the run
    pub fn summary(&self) -> String {
        let elapsed = self.finished_at - self.started_at;
        if self.failures.is_empty() {
            format!(
                "Run {} completed: {}/{} archives, {} records in {:.1}s",
                self.run_id,
                self.files_completed,
                self.files_total,
                self.records_emitted,
                elapsed.num_milliseconds() as f64 / 1000.0
            )
        } else {
            format!(
                "Run {} completed with {} failed archives: {}/{} archives, {} records in {:.1}s",
                self.run_id,
                self.failures.len(),
                self.files_completed,
                self.files_total,
                self.records_emitted,
                elapsed.num_milliseconds() as f64 / 1000.0
            )
        }
    }

    /// Returns the failure list, one archive per line
    pub fn details(&self) -> String {
        let mut details = vec![self.summary()];
        for (i, failure) in self.failures.iter().enumerate() {
            details.push(format!("  {}. {:?}: {}", i + 1, failure.path, failure.error));
        }
        details.join("\n")
    }
}
