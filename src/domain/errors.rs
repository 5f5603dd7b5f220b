use thiserror::Error;

/// Errors raised while decoding a record window.
///
/// A `FormatError` means the archive does not match the expected layout.
/// Decoding is all-or-nothing: when one is returned no `Record` exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Truncated field '{field}' at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Packed sample has {actual} bytes, expected {expected}")]
    SampleSize { expected: usize, actual: usize },

    #[error("Unsupported integer width {width} for field '{field}'")]
    IntegerWidth { field: &'static str, width: usize },
}

/// Errors raised when a `RecordLayout` descriptor is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("Field widths sum to {actual} bytes but record size is {declared}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("Sample is {width}x{height} but the pixel run is {actual} bytes, expected {expected}")]
    SampleRun {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Sample pixel count {0} is odd and cannot be nibble-packed")]
    OddPixelCount(usize),

    #[error("Layout must contain exactly one pixel run, found {0}")]
    PixelRunCount(usize),

    #[error("Field '{field}' appears more than once")]
    DuplicateField { field: &'static str },

    #[error("Unsupported integer width {width} for field '{field}'")]
    IntegerWidth { field: &'static str, width: usize },

    #[error("No built-in layout for archive format '{0}'")]
    UnsupportedFormat(String),
}
