use std::path::Path;

use crate::application::decoder::RecordDecoder;
use crate::application::errors::PipelineError;
use crate::domain::entities::Record;

/// Load one archive and decode `expected` records, pixels included.
///
/// Used outside the pipeline (inspection, benchmarks); any record that
/// fails to decode fails the whole archive.
pub fn read_archive(
    path: &Path,
    decoder: &RecordDecoder,
    expected: usize,
) -> Result<Vec<Record>, PipelineError> {
    let bytes = std::fs::read(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    decoder
        .records(&bytes, expected)
        .map(|(record_index, result)| {
            result.map_err(|source| PipelineError::Format {
                path: path.to_path_buf(),
                record_index,
                source,
            })
        })
        .collect()
}
