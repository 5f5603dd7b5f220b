//! Error types for the dataset pipeline
//!
//! Every failure carries enough location context (archive path, record
//! index) for a caller to assert on it without the process exiting.

use std::path::PathBuf;
use thiserror::Error;

use crate::application::pipeline::ManifestError;
use crate::application::ports::{EncodeError, StagingError};
use crate::domain::errors::{FormatError, LayoutError};

/// Coarse classification of a pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Format,
    Encode,
    Staging,
    Other,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Format error in {path:?} record {record_index}: {source}")]
    Format {
        path: PathBuf,
        record_index: usize,
        #[source]
        source: FormatError,
    },

    #[error("Encode error in {path:?} record {record_index}: {source}")]
    Encode {
        path: PathBuf,
        record_index: usize,
        #[source]
        source: EncodeError,
    },

    #[error("Metadata serialization failed for {image_name}: {source}")]
    Serialize {
        image_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Emitted {actual} records, expected {expected}")]
    RecordCountMismatch { expected: usize, actual: usize },

    #[error("Worker failed: {0}")]
    Worker(String),

    #[error("Run aborted after an earlier failure")]
    Aborted,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Io { .. } => ErrorKind::Io,
            PipelineError::Format { .. } => ErrorKind::Format,
            PipelineError::Encode {
                source: EncodeError::Io(_),
                ..
            } => ErrorKind::Io,
            PipelineError::Encode { .. } | PipelineError::Serialize { .. } => ErrorKind::Encode,
            PipelineError::Manifest(ManifestError::Io(_)) => ErrorKind::Io,
            PipelineError::Manifest(_) => ErrorKind::Encode,
            PipelineError::Staging(StagingError::Io(_)) => ErrorKind::Io,
            PipelineError::Staging(_) => ErrorKind::Staging,
            _ => ErrorKind::Other,
        }
    }

    /// Archive that failed, when the error is tied to one
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            PipelineError::Io { path, .. }
            | PipelineError::Format { path, .. }
            | PipelineError::Encode { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Record index inside the archive, when the error is tied to one
    pub fn record_index(&self) -> Option<usize> {
        match self {
            PipelineError::Format { record_index, .. }
            | PipelineError::Encode { record_index, .. } => Some(*record_index),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_kind_and_location() {
        let err = PipelineError::Format {
            path: PathBuf::from("ETL9G_01"),
            record_index: 7,
            source: FormatError::SampleSize {
                expected: 4,
                actual: 3,
            },
        };
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.path(), Some(std::path::Path::new("ETL9G_01")));
        assert_eq!(err.record_index(), Some(7));
        assert!(err.to_string().contains("record 7"));
    }

    #[test]
    fn test_encode_io_is_classified_as_io() {
        let err = PipelineError::Encode {
            path: PathBuf::from("ETL9G_01"),
            record_index: 0,
            source: EncodeError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_codec_error_is_encode_kind() {
        let err = PipelineError::Encode {
            path: PathBuf::from("ETL9G_01"),
            record_index: 0,
            source: EncodeError::Codec("bad".to_string()),
        };
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    #[test]
    fn test_staging_from_conversion() {
        let err: PipelineError = StagingError::DuplicateKey("x.png".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Staging);
        assert!(err.path().is_none());
    }
}
