use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::application::decoder::RecordDecoder;
use crate::application::errors::PipelineError;
use crate::application::materializer::ImageMaterializer;
use crate::application::pipeline::config::FailurePolicy;
use crate::application::pipeline::job::ArchiveJob;
use crate::application::pipeline::results::{FileFailure, WorkerReport};
use crate::application::ports::{StagingEntry, StagingError};

/// Shared flag raised by the first worker that fails under
/// [`FailurePolicy::Abort`]; the others stop at their next check.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Decodes whole archives pulled from the shared queue.
///
/// Per archive the worker:
/// 1. loads the whole file
/// 2. decodes each record window in order
/// 3. writes the record's image and releases its pixel buffer
/// 4. serializes the metadata into a local batch
/// 5. sends the batch to the staging writer as one message
///
/// Peak memory is one archive's bytes plus one image. Trailing bytes after
/// the last whole record are logged and skipped.
///
/// # Failure handling
///
/// With [`FailurePolicy::Abort`] the first error raises the shared
/// [`AbortSignal`] and is returned; other workers stop before their next
/// archive or record. With [`FailurePolicy::Collect`] the failed archive's
/// batch is dropped, a [`FileFailure`] is recorded in the [`WorkerReport`]
/// and the worker moves on.
///
/// # Thread Safety
///
/// Workers run on tokio's blocking pool. The decoder and materializer are
/// shared behind `Arc`, and the queue and commit channel are `flume`
/// handles, so nothing here takes a lock.
///
/// # Examples
///
/// ```rust,ignore
/// let (job_tx, job_rx) = flume::bounded(jobs.len());
/// let (commit_tx, writer) = StagingWriter::spawn(store, 4);
///
/// let worker = ArchiveWorker::new(0, decoder, materializer, FailurePolicy::Abort, AbortSignal::new());
/// let report = tokio::task::spawn_blocking(move || worker.run(job_rx, commit_tx)).await??;
/// println!("{} records committed", report.records_committed);
/// ```
pub struct ArchiveWorker {
    id: usize,
    decoder: Arc<RecordDecoder>,
    materializer: Arc<ImageMaterializer>,
    policy: FailurePolicy,
    abort: AbortSignal,
}

impl ArchiveWorker {
    pub fn new(
        id: usize,
        decoder: Arc<RecordDecoder>,
        materializer: Arc<ImageMaterializer>,
        policy: FailurePolicy,
        abort: AbortSignal,
    ) -> Self {
        Self {
            id,
            decoder,
            materializer,
            policy,
            abort,
        }
    }

    /// Run until the queue is closed and drained
    pub fn run(
        self,
        jobs: flume::Receiver<ArchiveJob>,
        commits: flume::Sender<Vec<StagingEntry>>,
    ) -> Result<WorkerReport, PipelineError> {
        let mut report = WorkerReport::new(self.id);

        while let Ok(job) = jobs.recv() {
            if self.abort.is_raised() {
                return Err(PipelineError::Aborted);
            }

            match self.process(&job) {
                Ok(batch) => {
                    let count = batch.len();
                    commits.send(batch).map_err(|_| {
                        StagingError::WriterStopped(format!(
                            "batch for {:?} could not be committed",
                            job.path
                        ))
                    })?;
                    report.files_completed += 1;
                    report.records_committed += count;
                    info!(
                        "Worker {} committed {} records from {:?}",
                        self.id, count, job.path
                    );
                }
                Err(PipelineError::Aborted) => return Err(PipelineError::Aborted),
                Err(error) => match self.policy {
                    FailurePolicy::Abort => {
                        self.abort.raise();
                        return Err(error);
                    }
                    FailurePolicy::Collect => {
                        warn!("Worker {} skipping {:?}: {}", self.id, job.path, error);
                        report.failures.push(FileFailure {
                            path: job.path.clone(),
                            error,
                        });
                    }
                },
            }
        }

        debug!("Worker {} terminated: queue drained", self.id);
        Ok(report)
    }

    /// Decode one archive into its metadata batch
    pub fn process(&self, job: &ArchiveJob) -> Result<Vec<StagingEntry>, PipelineError> {
        info!("Worker {} reading {:?}", self.id, job.path);

        // Whole-file read: archives are bounded in size
        let bytes = std::fs::read(&job.path).map_err(|source| PipelineError::Io {
            path: job.path.clone(),
            source,
        })?;

        let needed = job.expected_records * self.decoder.layout().record_size();
        if bytes.len() > needed {
            warn!(
                "{:?}: ignoring {} trailing bytes after {} records",
                job.path,
                bytes.len() - needed,
                job.expected_records
            );
        }

        let mut batch = Vec::with_capacity(job.expected_records);
        for (record_index, decoded) in self.decoder.records(&bytes, job.expected_records) {
            if self.abort.is_raised() {
                return Err(PipelineError::Aborted);
            }

            let mut record = decoded.map_err(|source| PipelineError::Format {
                path: job.path.clone(),
                record_index,
                source,
            })?;

            self.materializer
                .materialize(&record)
                .map_err(|source| PipelineError::Encode {
                    path: job.path.clone(),
                    record_index,
                    source,
                })?;
            record.release_pixels();

            let metadata = record.into_metadata();
            let value =
                serde_json::to_vec(&metadata).map_err(|source| PipelineError::Serialize {
                    image_name: metadata.image_name.to_string(),
                    source,
                })?;
            batch.push(StagingEntry::new(metadata.image_name.into_string(), value));
        }

        Ok(batch)
    }
}
