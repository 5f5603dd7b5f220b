use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::application::ports::LabelLookup;

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("Failed to read label table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Label table line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// Code to label table loaded from a tab-separated file.
///
/// One mapping per line, `0x2422<TAB>あ`. The code is hexadecimal with an
/// optional `0x` prefix. Blank lines and lines starting with `#` are
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct TableLabelLookup {
    labels: HashMap<u16, String>,
}

impl TableLabelLookup {
    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let text = std::fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text)?;
        info!("Loaded {} labels from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn parse(text: &str) -> Result<Self, LabelError> {
        let mut labels = HashMap::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let (code, label) = line.split_once('\t').ok_or_else(|| LabelError::Parse {
                line: i + 1,
                reason: "expected <code>\\t<label>".to_string(),
            })?;
            let code = code.trim();
            let digits = code
                .strip_prefix("0x")
                .or_else(|| code.strip_prefix("0X"))
                .unwrap_or(code);
            let code = u16::from_str_radix(digits, 16).map_err(|e| LabelError::Parse {
                line: i + 1,
                reason: format!("invalid code {:?}: {}", code, e),
            })?;

            labels.insert(code, label.trim().to_string());
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl LabelLookup for TableLabelLookup {
    fn label(&self, code: u16) -> Option<String> {
        self.labels.get(&code).cloned()
    }
}
