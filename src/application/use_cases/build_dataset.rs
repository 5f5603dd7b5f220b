use chrono::Utc;
use futures_util::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::decoder::RecordDecoder;
use crate::application::errors::PipelineError;
use crate::application::materializer::ImageMaterializer;
use crate::application::pipeline::{
    AbortSignal, ArchiveJob, ArchiveWorker, ManifestWriter, PipelineConfig, RunSummary,
    StagingWriter, WorkerReport,
};
use crate::application::ports::StagingStore;

/// Use case: decode an archive set into images plus a manifest.
///
/// This is the orchestrator of a dataset run. It owns nothing long-lived:
/// each call to [`execute`](Self::execute) builds the job queue, the
/// worker pool and the staging writer, waits for all of them, and then
/// emits the manifest from the staged entries in image-name order.
///
/// A run goes through these stages:
/// - **Fan-out**: every [`ArchiveJob`] is queued once and the queue is closed
/// - **Decode**: workers on the blocking pool decode, write images and commit
///   one metadata batch per archive
/// - **Staging**: a single writer applies batches to the [`StagingStore`]
/// - **Emission**: the manifest is written and staging storage is discarded
///
/// Under [`FailurePolicy::Abort`](crate::pipeline::FailurePolicy::Abort) the
/// first error stops every worker and no manifest is written. Under
/// `Collect` failed archives are reported in the [`RunSummary`] and the
/// manifest covers the archives that succeeded.
///
/// # Thread Safety
///
/// The decoder and materializer are shared read-only across workers. The
/// staging store is moved into the writer task, so no lock guards it.
///
/// # Examples
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use glyph_dataset::application::decoder::RecordDecoder;
/// use glyph_dataset::application::materializer::ImageMaterializer;
/// use glyph_dataset::infrastructure::staging::MemoryStagingStore;
/// use glyph_dataset::pipeline::{FailurePolicy, PipelineConfig};
/// use glyph_dataset::use_cases::BuildDatasetUseCase;
///
/// let use_case = BuildDatasetUseCase::new(
///     Arc::new(RecordDecoder::new(layout, labels)),
///     Arc::new(ImageMaterializer::new(encoder, output_dir, output_size)),
///     PipelineConfig::new(4, FailurePolicy::Abort),
/// );
///
/// let summary = use_case
///     .execute(jobs, Box::new(MemoryStagingStore::new()), &manifest_path, Some(607_200))
///     .await?;
/// println!("{}", summary.summary());
/// ```
///
/// Most callers go through [`DatasetBuilder`](crate::application::builder::DatasetBuilder),
/// which derives all of these from a [`Config`](crate::Config).
pub struct BuildDatasetUseCase {
    decoder: Arc<RecordDecoder>,
    materializer: Arc<ImageMaterializer>,
    config: PipelineConfig,
}

impl BuildDatasetUseCase {
    pub fn new(
        decoder: Arc<RecordDecoder>,
        materializer: Arc<ImageMaterializer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            decoder,
            materializer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Execute the build.
    ///
    /// Jobs are fanned out to the worker pool, batches are staged through
    /// the writer actor, and the manifest is emitted once every worker has
    /// finished. `expected_total` is checked against the emitted count when
    /// no archive failed.
    pub async fn execute(
        &self,
        jobs: Vec<ArchiveJob>,
        staging: Box<dyn StagingStore>,
        manifest_path: &Path,
        expected_total: Option<usize>,
    ) -> Result<RunSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let files_total = jobs.len();
        let worker_count = self.config.effective_workers(files_total);

        info!(
            "Run {} starting: {} archives, {} workers, policy {}",
            run_id, files_total, worker_count, self.config.failure_policy
        );

        // 1. Fill the queue once and close it
        let (job_tx, job_rx) = flume::bounded(files_total.max(1));
        for job in jobs {
            job_tx
                .send(job)
                .map_err(|e| PipelineError::Worker(format!("queue rejected job: {}", e)))?;
        }
        drop(job_tx);

        // 2. Single writer owns the staging store
        let (commit_tx, writer) = StagingWriter::spawn(staging, worker_count);

        // 3. Worker pool
        let abort = AbortSignal::new();
        let handles: Vec<_> = (0..worker_count)
            .map(|id| {
                let worker = ArchiveWorker::new(
                    id,
                    Arc::clone(&self.decoder),
                    Arc::clone(&self.materializer),
                    self.config.failure_policy,
                    abort.clone(),
                );
                let jobs = job_rx.clone();
                let commits = commit_tx.clone();
                tokio::task::spawn_blocking(move || worker.run(jobs, commits))
            })
            .collect();
        drop(job_rx);
        drop(commit_tx);

        let outcomes = join_all(handles).await;
        let written = writer.await;

        // Writer failures first: they explain the workers' WriterStopped errors
        let store = match written {
            Ok(Ok(store)) => store,
            Ok(Err(e)) => {
                error!("Run {} failed in staging writer: {}", run_id, e);
                return Err(e.into());
            }
            Err(e) => return Err(PipelineError::Worker(format!("staging writer panicked: {}", e))),
        };

        let mut reports: Vec<WorkerReport> = Vec::with_capacity(worker_count);
        let mut first_error: Option<PipelineError> = None;
        let mut aborted = false;
        for outcome in outcomes {
            match outcome {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(PipelineError::Aborted)) => aborted = true,
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(PipelineError::Worker(format!(
                            "worker panicked: {}",
                            e
                        )));
                    }
                }
            }
        }
        if let Some(e) = first_error {
            error!("Run {} aborted: {}", run_id, e);
            return Err(e);
        }
        if aborted {
            return Err(PipelineError::Aborted);
        }

        let files_completed: usize = reports.iter().map(|r| r.files_completed).sum();
        let records_committed: usize = reports.iter().map(|r| r.records_committed).sum();
        let failures: Vec<_> = reports.into_iter().flat_map(|r| r.failures).collect();

        if store.len() != records_committed {
            return Err(PipelineError::RecordCountMismatch {
                expected: records_committed,
                actual: store.len(),
            });
        }

        // 4. Emit in key order and discard staging
        let manifest_path: PathBuf = manifest_path.to_path_buf();
        let records_emitted = ManifestWriter::emit(store, &manifest_path)?;

        if failures.is_empty() {
            if let Some(expected) = expected_total {
                if records_emitted != expected {
                    return Err(PipelineError::RecordCountMismatch {
                        expected,
                        actual: records_emitted,
                    });
                }
            }
        } else {
            warn!(
                "Run {}: {} archives failed and were left out of the manifest",
                run_id,
                failures.len()
            );
        }

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            files_total,
            files_completed,
            records_emitted,
            manifest_path,
            failures,
        };
        info!("{}", summary.summary());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::FailurePolicy;
    use crate::application::ports::{Dimensions, EncodeError, MockImageEncoder, NoLabels};
    use crate::domain::layout::{Field, RecordLayout};
    use crate::domain::value_objects::FormatTag;
    use crate::infrastructure::staging::MemoryStagingStore;
    use tempfile::TempDir;

    fn use_case(encoder: MockImageEncoder, out: &Path, policy: FailurePolicy) -> BuildDatasetUseCase {
        let layout = RecordLayout::builder(FormatTag::Etl9g, 2, 2)
            .unsigned(Field::CharacterCode, 2)
            .pixels()
            .build(4)
            .unwrap();
        BuildDatasetUseCase::new(
            Arc::new(RecordDecoder::new(layout, Arc::new(NoLabels))),
            Arc::new(ImageMaterializer::new(
                Arc::new(encoder),
                out.to_path_buf(),
                Dimensions::new(2, 2),
            )),
            PipelineConfig::new(2, policy),
        )
    }

    fn job(dir: &TempDir, name: &str, bytes: &[u8], expected_records: usize) -> ArchiveJob {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        ArchiveJob {
            path,
            index: 0,
            expected_records,
        }
    }

    #[tokio::test]
    async fn test_execute_emits_sorted_manifest() {
        let dir = TempDir::new().unwrap();
        let mut encoder = MockImageEncoder::new();
        encoder
            .expect_encode_to_file()
            .times(3)
            .returning(|_, _, _, _| Ok(()));
        let uc = use_case(encoder, &dir.path().join("out"), FailurePolicy::Abort);

        let jobs = vec![
            job(&dir, "A_01", &[0x30, 0x21, 0x11, 0x11, 0x24, 0x22, 0x22, 0x22], 2),
            job(&dir, "A_02", &[0x25, 0x21, 0x33, 0x33], 1),
        ];
        let manifest = dir.path().join("out").join("etl9g.json");
        let summary = uc
            .execute(jobs, Box::new(MemoryStagingStore::new()), &manifest, Some(3))
            .await
            .unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.records_emitted, 3);
        assert_eq!(summary.files_completed, 2);

        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(&manifest).unwrap()).unwrap();
        let names: Vec<&str> = parsed
            .iter()
            .map(|v| v["image_name"].as_str().unwrap())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_execute_count_mismatch() {
        let dir = TempDir::new().unwrap();
        let mut encoder = MockImageEncoder::new();
        encoder.expect_encode_to_file().returning(|_, _, _, _| Ok(()));
        let uc = use_case(encoder, dir.path(), FailurePolicy::Abort);

        let jobs = vec![job(&dir, "A_01", &[0x30, 0x21, 0x11, 0x11], 1)];
        let err = uc
            .execute(
                jobs,
                Box::new(MemoryStagingStore::new()),
                &dir.path().join("m.json"),
                Some(2),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::RecordCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_execute_abort_returns_encode_error() {
        let dir = TempDir::new().unwrap();
        let mut encoder = MockImageEncoder::new();
        encoder
            .expect_encode_to_file()
            .returning(|_, _, _, _| Err(EncodeError::Codec("disk full".to_string())));
        let uc = use_case(encoder, dir.path(), FailurePolicy::Abort);

        let manifest = dir.path().join("m.json");
        let jobs = vec![job(&dir, "A_01", &[0x30, 0x21, 0x11, 0x11], 1)];
        let err = uc
            .execute(jobs, Box::new(MemoryStagingStore::new()), &manifest, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Encode { record_index: 0, .. }));
        assert!(!manifest.exists());
    }

    #[tokio::test]
    async fn test_execute_collect_reports_failed_archive() {
        let dir = TempDir::new().unwrap();
        let mut encoder = MockImageEncoder::new();
        encoder.expect_encode_to_file().returning(|_, _, _, _| Ok(()));
        let uc = use_case(encoder, dir.path(), FailurePolicy::Collect);

        let manifest = dir.path().join("m.json");
        let jobs = vec![
            job(&dir, "A_01", &[0x30, 0x21, 0x11, 0x11], 1),
            job(&dir, "A_02", &[0x30, 0x21], 1),
        ];
        let summary = uc
            .execute(jobs, Box::new(MemoryStagingStore::new()), &manifest, Some(2))
            .await
            .unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].path.ends_with("A_02"));
        assert_eq!(summary.records_emitted, 1);
    }
}
