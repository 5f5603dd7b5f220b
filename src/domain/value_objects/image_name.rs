use serde::{Deserialize, Serialize};

use super::{ContentHash, FormatTag};

/// Deterministic image file name: `<PREFIX>_0x<code>_<sha256>.png`.
///
/// Uniqueness across a run rests on the content hash component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageName(String);

impl ImageName {
    pub fn new(format: FormatTag, character_code: u16, hash: &ContentHash) -> Self {
        Self(format!(
            "{}_0x{:x}_{}.png",
            format.file_prefix(),
            character_code,
            hash.as_hex()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ImageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
