use crate::domain::errors::FormatError;

/// Forward-only reader over one record window.
///
/// Every read names the field it serves so underflows report where the
/// archive diverged from the layout.
#[derive(Debug)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Borrow the next `len` bytes
    #[inline]
    pub fn take(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::Truncated {
                field,
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a big-endian unsigned integer of 1, 2 or 4 bytes
    #[inline]
    pub fn read_uint_be(&mut self, field: &'static str, width: usize) -> Result<u32, FormatError> {
        if !matches!(width, 1 | 2 | 4) {
            return Err(FormatError::IntegerWidth { field, width });
        }
        let bytes = self.take(field, width)?;
        Ok(bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
    }

    /// Consume a reserved run
    pub fn skip(&mut self, field: &'static str, len: usize) -> Result<(), FormatError> {
        self.take(field, len).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_uint_be_widths() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_uint_be("a", 1).unwrap(), 0x01);
        assert_eq!(cursor.read_uint_be("b", 2).unwrap(), 0x0203);
        assert_eq!(cursor.read_uint_be("c", 4).unwrap(), 0x04050607);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_take_underflow_reports_field() {
        let data = [0u8; 3];
        let mut cursor = ByteCursor::new(&data);
        cursor.skip("reserved", 2).unwrap();
        let err = cursor.read_uint_be("serial_data_number", 4).unwrap_err();
        assert_eq!(
            err,
            FormatError::Truncated {
                field: "serial_data_number",
                offset: 2,
                needed: 4,
                available: 1,
            }
        );
        // A failed read does not advance
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn test_rejects_unsupported_width() {
        let data = [0u8; 8];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            cursor.read_uint_be("x", 3),
            Err(FormatError::IntegerWidth { width: 3, .. })
        ));
    }
}
