use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::application::ports::{Dimensions, EncodeError, ImageEncoder};
use crate::domain::entities::Record;

/// Turns a record's pixel buffer into an image file named after the record.
///
/// Resampling only happens when the requested size differs from the
/// sample's native size. Encoding is delegated to the [`ImageEncoder`] port.
pub struct ImageMaterializer {
    encoder: Arc<dyn ImageEncoder>,
    output_dir: PathBuf,
    output_size: Dimensions,
    dir_ready: OnceCell<()>,
}

impl ImageMaterializer {
    pub fn new(encoder: Arc<dyn ImageEncoder>, output_dir: PathBuf, output_size: Dimensions) -> Self {
        Self {
            encoder,
            output_dir,
            output_size,
            dir_ready: OnceCell::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn output_size(&self) -> Dimensions {
        self.output_size
    }

    /// Write the image for `record` and return its path
    pub fn materialize(&self, record: &Record) -> Result<PathBuf, EncodeError> {
        let pixels = record
            .pixels()
            .ok_or_else(|| EncodeError::MissingPixels(record.image_name().to_string()))?;

        let native = Dimensions::new(record.width(), record.height());
        if pixels.len() != native.pixel_count() {
            return Err(EncodeError::BufferSize {
                expected: native.pixel_count(),
                actual: pixels.len(),
            });
        }

        self.dir_ready
            .get_or_try_init(|| std::fs::create_dir_all(&self.output_dir))?;

        let resize = (self.output_size != native).then_some(self.output_size);
        let dest = self.output_dir.join(record.image_name().as_str());
        self.encoder.encode_to_file(pixels, native, resize, &dest)?;

        debug!("Wrote image {:?} ({})", dest, resize.unwrap_or(native));
        Ok(dest)
    }
}
