use crate::domain::errors::FormatError;

/// Scale applied to each 4-bit sample. `v * 16` tops out at 240, not 255;
/// downstream datasets were built with this range, so it is kept as is.
pub const NIBBLE_SCALE: u8 = 16;

/// Expand a packed 4-bit buffer into one grayscale byte per pixel.
///
/// Each input byte yields its high nibble first, then its low nibble.
/// Output length is always `2 * packed.len()`; `expected_len` guards the
/// packed size declared by the layout.
pub fn unpack_nibbles(packed: &[u8], expected_len: usize) -> Result<Vec<u8>, FormatError> {
    if packed.len() != expected_len {
        return Err(FormatError::SampleSize {
            expected: expected_len,
            actual: packed.len(),
        });
    }

    let mut pixels = Vec::with_capacity(packed.len() * 2);
    for &byte in packed {
        pixels.push((byte >> 4) * NIBBLE_SCALE);
        pixels.push((byte & 0x0F) * NIBBLE_SCALE);
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_nibble_first() {
        let pixels = unpack_nibbles(&[0x1F, 0xA0], 2).unwrap();
        assert_eq!(pixels, vec![16, 240, 160, 0]);
    }

    #[test]
    fn test_full_scale_is_240() {
        let pixels = unpack_nibbles(&[0xFF], 1).unwrap();
        assert_eq!(pixels, vec![240, 240]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = unpack_nibbles(&[0x00; 3], 4).unwrap_err();
        assert_eq!(
            err,
            FormatError::SampleSize {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(unpack_nibbles(&[], 0).unwrap().is_empty());
    }
}
