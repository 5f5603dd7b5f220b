#[cfg(test)]
use mockall::{automock, predicate::*};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Pixel buffer already released for {0}")]
    MissingPixels(String),
}

/// Width and height of a raster in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Port for the lossless raster codec
#[cfg_attr(test, automock)]
pub trait ImageEncoder: Send + Sync {
    /// Encode an 8-bit grayscale buffer to `dest`.
    /// When `resize` is set the image is resampled to it before encoding.
    fn encode_to_file(
        &self,
        pixels: &[u8],
        native: Dimensions,
        resize: Option<Dimensions>,
        dest: &Path,
    ) -> Result<(), EncodeError>;
}
