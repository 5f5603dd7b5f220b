//! Manifest emission
//!
//! The manifest is a single JSON array with one metadata object per line,
//! streamed from the staging store in key order. It is written to a
//! temporary sibling and renamed into place, so a reader never observes a
//! half-written file.

use serde::de::IgnoredAny;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::application::ports::{StagingError, StagingStore};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("Staged value for {key} is not valid JSON: {source}")]
    InvalidElement {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Incremental encoder for a JSON array of pre-serialized elements.
///
/// Produces `[\n{..},\n{..}\n]\n`; an empty array is `[]\n`.
pub struct JsonArrayWriter<W: Write> {
    out: W,
    count: usize,
}

impl<W: Write> JsonArrayWriter<W> {
    pub fn begin(mut out: W) -> std::io::Result<Self> {
        out.write_all(b"[")?;
        Ok(Self { out, count: 0 })
    }

    /// Append one element; `element` must already be a JSON value
    pub fn push_raw(&mut self, element: &[u8]) -> std::io::Result<()> {
        if self.count == 0 {
            self.out.write_all(b"\n")?;
        } else {
            self.out.write_all(b",\n")?;
        }
        self.out.write_all(element)?;
        self.count += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Close the array and hand back the sink
    pub fn finish(mut self) -> std::io::Result<W> {
        if self.count == 0 {
            self.out.write_all(b"]\n")?;
        } else {
            self.out.write_all(b"\n]\n")?;
        }
        Ok(self.out)
    }
}

/// Streams a staging store into the manifest file
pub struct ManifestWriter;

impl ManifestWriter {
    /// Write every staged entry to `path` in key order, then discard the store.
    ///
    /// Staged values are raw JSON bytes copied verbatim into the array. Each
    /// one is parsed once before copying, so a value damaged in the staging
    /// database fails the run with [`ManifestError::InvalidElement`] instead
    /// of producing a manifest that is not valid JSON.
    ///
    /// Returns the number of elements written.
    pub fn emit(store: Box<dyn StagingStore>, path: &Path) -> Result<usize, ManifestError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = temp_path_for(path);
        let written = match Self::write_to(store.as_ref(), &temp_path) {
            Ok(count) => count,
            Err(e) => {
                let _ = std::fs::remove_file(&temp_path);
                return Err(e);
            }
        };
        std::fs::rename(&temp_path, path)?;
        info!("Manifest {:?} written with {} entries", path, written);

        store.discard()?;
        debug!("Staging store discarded");
        Ok(written)
    }

    fn write_to(store: &dyn StagingStore, temp_path: &Path) -> Result<usize, ManifestError> {
        let file = File::create(temp_path)?;
        let mut array = JsonArrayWriter::begin(BufWriter::new(file))?;

        for entry in store.iter_ordered()? {
            let entry = entry?;
            serde_json::from_slice::<IgnoredAny>(&entry.value).map_err(|source| {
                ManifestError::InvalidElement {
                    key: entry.key.clone(),
                    source,
                }
            })?;
            array.push_raw(&entry.value)?;
        }

        let count = array.len();
        let writer = array.finish()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(count)
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
