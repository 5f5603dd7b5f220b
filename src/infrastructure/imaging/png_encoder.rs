use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, GrayImage, ImageEncoder as _};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::ports::{Dimensions, EncodeError, ImageEncoder};

/// PNG adapter for the [`ImageEncoder`] port.
///
/// Grayscale buffers are optionally resampled with Lanczos3, encoded at
/// best compression and written to a temp sibling that is renamed into
/// place.
#[derive(Debug, Clone, Default)]
pub struct PngImageEncoder {
    durable_writes: bool,
}

impl PngImageEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// fsync every image before the rename
    pub fn with_durability(durable_writes: bool) -> Self {
        Self { durable_writes }
    }

    fn write_png(&self, image: &GrayImage, temp_path: &Path) -> Result<(), EncodeError> {
        let file = File::create(temp_path)?;
        let mut writer = BufWriter::new(file);
        PngEncoder::new_with_quality(&mut writer, CompressionType::Best, PngFilter::Adaptive)
            .write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ExtendedColorType::L8,
            )
            .map_err(|e| EncodeError::Codec(e.to_string()))?;

        let file = writer.into_inner().map_err(|e| e.into_error())?;
        if self.durable_writes {
            file.sync_all()?;
        }
        Ok(())
    }
}

fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", Uuid::new_v4()));
    dest.with_file_name(name)
}

impl ImageEncoder for PngImageEncoder {
    fn encode_to_file(
        &self,
        pixels: &[u8],
        native: Dimensions,
        resize: Option<Dimensions>,
        dest: &Path,
    ) -> Result<(), EncodeError> {
        if pixels.len() != native.pixel_count() {
            return Err(EncodeError::BufferSize {
                expected: native.pixel_count(),
                actual: pixels.len(),
            });
        }

        let image = GrayImage::from_raw(native.width, native.height, pixels.to_vec()).ok_or(
            EncodeError::BufferSize {
                expected: native.pixel_count(),
                actual: pixels.len(),
            },
        )?;

        let image = match resize {
            Some(size) if size != native => {
                imageops::resize(&image, size.width, size.height, FilterType::Lanczos3)
            }
            _ => image,
        };

        let temp_path = temp_path_for(dest);
        if let Err(e) = self.write_png(&image, &temp_path) {
            warn!("Failed to encode {:?}: {}", dest, e);
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
        if let Err(e) = std::fs::rename(&temp_path, dest) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!("Encoded {:?} ({}x{})", dest, image.width(), image.height());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height).map(|i| ((i % 16) * 16) as u8).collect()
    }

    #[test]
    fn test_encode_native_size_round_trips_pixels() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a.png");
        let pixels = gradient(8, 4);

        PngImageEncoder::new()
            .encode_to_file(&pixels, Dimensions::new(8, 4), None, &dest)
            .unwrap();

        let decoded = image::open(&dest).unwrap().into_luma8();
        assert_eq!(decoded.dimensions(), (8, 4));
        assert_eq!(decoded.into_raw(), pixels);
    }

    #[test]
    fn test_encode_resizes() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("b.png");

        PngImageEncoder::with_durability(true)
            .encode_to_file(
                &gradient(8, 4),
                Dimensions::new(8, 4),
                Some(Dimensions::new(4, 2)),
                &dest,
            )
            .unwrap();

        let decoded = image::open(&dest).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 2));
    }

    #[test]
    fn test_encode_rejects_wrong_buffer() {
        let dir = TempDir::new().unwrap();
        let err = PngImageEncoder::new()
            .encode_to_file(&[0u8; 3], Dimensions::new(2, 2), None, &dir.path().join("c.png"))
            .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::BufferSize {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = PngImageEncoder::new()
            .encode_to_file(
                &[0u8; 4],
                Dimensions::new(2, 2),
                None,
                &dir.path().join("absent").join("d.png"),
            )
            .unwrap_err();
        assert!(matches!(err, EncodeError::Io(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
