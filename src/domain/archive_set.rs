use std::path::{Path, PathBuf};

use crate::domain::errors::LayoutError;
use crate::domain::value_objects::FormatTag;

/// On-disk shape of one archive family: how many files, how they are
/// named and how many records each holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSet {
    prefix: String,
    file_count: usize,
    records_per_file: usize,
    last_file_records: usize,
}

impl ArchiveSet {
    /// Every file holds the same number of records
    pub fn uniform(prefix: impl Into<String>, file_count: usize, records_per_file: usize) -> Self {
        Self {
            prefix: prefix.into(),
            file_count,
            records_per_file,
            last_file_records: records_per_file,
        }
    }

    /// The last file is shorter than the others
    pub fn with_partial_last(
        prefix: impl Into<String>,
        file_count: usize,
        records_per_file: usize,
        last_file_records: usize,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            file_count,
            records_per_file,
            last_file_records,
        }
    }

    /// Distribution shape of the built-in families
    pub fn for_format(format: FormatTag) -> Result<Self, LayoutError> {
        match format {
            FormatTag::Etl8g => Ok(Self::with_partial_last(format.file_prefix(), 33, 4780, 956)),
            FormatTag::Etl9g => Ok(Self::uniform(format.file_prefix(), 50, 12144)),
            other => Err(LayoutError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn records_per_file(&self) -> usize {
        self.records_per_file
    }

    /// Records held by the file at `index` (0-based)
    pub fn records_in_file(&self, index: usize) -> usize {
        if self.file_count > 0 && index == self.file_count - 1 {
            self.last_file_records
        } else {
            self.records_per_file
        }
    }

    /// `(file_count - 1) * records_per_file + last_file_records`
    pub fn expected_total(&self) -> usize {
        if self.file_count == 0 {
            return 0;
        }
        (self.file_count - 1) * self.records_per_file + self.last_file_records
    }

    /// File name at `index` (0-based), e.g. `ETL9G_01`
    pub fn file_name(&self, index: usize) -> String {
        format!("{}_{:02}", self.prefix, index + 1)
    }

    /// Enumerate every archive path under `input_dir`
    pub fn paths(&self, input_dir: &Path) -> Vec<PathBuf> {
        (0..self.file_count)
            .map(|i| input_dir.join(self.file_name(i)))
            .collect()
    }
}
