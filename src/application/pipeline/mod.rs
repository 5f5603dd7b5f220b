//! Parallel archive pipeline: job queue, workers, staging writer and
//! manifest emission.

mod archive_reader;
mod config;
mod job;
mod manifest;
mod results;
mod staging_writer;
mod worker;

pub use archive_reader::read_archive;
pub use config::{FailurePolicy, PipelineConfig};
pub use job::ArchiveJob;
pub use manifest::{JsonArrayWriter, ManifestError, ManifestWriter};
pub use results::{FileFailure, RunSummary, WorkerReport};
pub use staging_writer::StagingWriter;
pub use worker::{AbortSignal, ArchiveWorker};
