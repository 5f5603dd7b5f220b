use std::path::{Path, PathBuf};

use crate::domain::ArchiveSet;

/// One archive file queued for a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    pub path: PathBuf,
    /// Position in the archive set (0-based)
    pub index: usize,
    /// Records the worker must decode from this file
    pub expected_records: usize,
}

impl ArchiveJob {
    /// One job per file of `set`, in file order
    pub fn from_set(set: &ArchiveSet, input_dir: &Path) -> Vec<ArchiveJob> {
        set.paths(input_dir)
            .into_iter()
            .enumerate()
            .map(|(index, path)| ArchiveJob {
                path,
                index,
                expected_records: set.records_in_file(index),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_follow_set_shape() {
        let set = ArchiveSet::with_partial_last("ETL8G", 3, 10, 4);
        let jobs = ArchiveJob::from_set(&set, Path::new("/in"));
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].path, PathBuf::from("/in/ETL8G_01"));
        assert_eq!(jobs[0].expected_records, 10);
        assert_eq!(jobs[2].index, 2);
        assert_eq!(jobs[2].expected_records, 4);
    }
}
