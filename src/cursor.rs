use crate::error::{ClassDecodeError, Result};

/// Sequential big-endian reader over a borrowed byte buffer.
///
/// Every read is bounds-checked; a short read fails with
/// [`ClassDecodeError::TruncatedInput`] carrying the offset the read started
/// at, and leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    position: usize,
    base: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor::with_base(bytes, 0)
    }
    /// A cursor whose reported offsets are shifted by `base`, for reading a
    /// slice cut out of a larger buffer.
    pub fn with_base(bytes: &'a [u8], base: usize) -> ByteCursor<'a> {
        ByteCursor {
            bytes,
            position: 0,
            base,
        }
    }
    pub fn position(&self) -> usize {
        self.position
    }
    /// Position relative to the start of the outermost buffer.
    pub fn offset(&self) -> usize {
        self.base + self.position
    }
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.position.checked_add(n)
            .ok_or(ClassDecodeError::TruncatedInput { offset: self.offset() })?;
        let slc = self.bytes.get(self.position..end)
            .ok_or(ClassDecodeError::TruncatedInput { offset: self.offset() })?;
        self.position = end;
        Ok(slc)
    }
    pub fn read_u1(&mut self) -> Result<u8> {
        self.take(1).map(|c| c[0])
    }
    pub fn read_u2(&mut self) -> Result<u16> {
        let i = self.take(2)?;
        Ok(u16::from_be_bytes([i[0], i[1]]))
    }
    pub fn read_u4(&mut self) -> Result<u32> {
        let i = self.take(4)?;
        Ok(u32::from_be_bytes([i[0], i[1], i[2], i[3]]))
    }
    pub fn read_u8(&mut self) -> Result<u64> {
        let i = self.take(8)?;
        let mut buf = [0; 8];
        buf.copy_from_slice(i);
        Ok(u64::from_be_bytes(buf))
    }
    pub fn read_i1(&mut self) -> Result<i8> {
        self.read_u1().map(|c| c as i8)
    }
    pub fn read_i2(&mut self) -> Result<i16> {
        self.read_u2().map(|c| c as i16)
    }
    pub fn read_i4(&mut self) -> Result<i32> {
        self.read_u4().map(|c| c as i32)
    }
    pub fn read_i8(&mut self) -> Result<i64> {
        self.read_u8().map(|c| c as i64)
    }
    pub fn read_f4(&mut self) -> Result<f32> {
        self.read_u4().map(f32::from_bits)
    }
    pub fn read_f8(&mut self) -> Result<f64> {
        self.read_u8().map(f64::from_bits)
    }
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian() {
        let bytes = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x01, 0xFF];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u4(), Ok(0xCAFEBABE));
        assert_eq!(cursor.read_u2(), Ok(1));
        assert_eq!(cursor.read_i1(), Ok(-1));
        assert!(cursor.is_empty());
    }

    #[test]
    fn reads_eight_bytes() {
        let bytes = 0x0102_0304_0506_0708u64.to_be_bytes();
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u8(), Ok(0x0102_0304_0506_0708));
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn short_read_reports_start_offset() {
        let bytes = [0, 1, 2];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.read_u1().unwrap();
        assert_eq!(cursor.read_u4(), Err(ClassDecodeError::TruncatedInput { offset: 1 }));
        // a failed read does not move the cursor
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_bytes(2), Ok(&bytes[1..]));
        assert_eq!(cursor.read_bytes(1), Err(ClassDecodeError::TruncatedInput { offset: 3 }));
    }

    #[test]
    fn base_shifts_reported_offsets() {
        let bytes = [7];
        let mut cursor = ByteCursor::with_base(&bytes, 100);
        assert_eq!(cursor.read_u2(), Err(ClassDecodeError::TruncatedInput { offset: 100 }));
        assert_eq!(cursor.read_u1(), Ok(7));
        assert_eq!(cursor.offset(), 101);
    }
}
