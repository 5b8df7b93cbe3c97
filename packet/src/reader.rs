//! Decode-direction serializer.
//!
//! Input is untrusted: every length and bounded value is validated against the declared
//! contract before it reaches the object.

use crate::{
    bounded::{Bounds, Integer},
    cursor::Cursor,
    latch::Latch,
    Direction, Error, Kind, Serializer,
};

/// Reads fields from a received buffer into an object.
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
    latch: Latch,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
            latch: Latch::new(),
        }
    }

    /// Returns the whole buffer.
    pub fn buffer(&self) -> &[u8] {
        self.cursor.buffer()
    }

    /// Returns the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    /// Returns the number of bytes consumed, or the error that first invalidated the reader.
    pub fn finish(self) -> Result<usize, Error> {
        self.latch.finish(self.cursor.position())
    }

    fn read_bounded<T: Integer>(
        &mut self,
        bounds: Bounds<T>,
        name: &'static str,
    ) -> Result<T, Error> {
        if !bounds.is_valid() {
            return Err(Error::InvalidBounds(name));
        }
        let width = bounds.width();
        let mut scratch = [0u8; 8];
        self.cursor.peek(&mut scratch[..width.len()])?;
        let value = bounds.value(width.unpack(&scratch[..width.len()]), name)?;
        self.cursor.read(&mut scratch[..width.len()])?;
        Ok(value)
    }

    fn read_bytes(&mut self, buf: &mut [u8], name: &'static str) -> Result<usize, Error> {
        let bounds = Bounds::new(0..=buf.len());
        let width = bounds.width();
        let mut scratch = [0u8; 8];
        self.cursor.peek(&mut scratch[..width.len()])?;
        let len = bounds.value(width.unpack(&scratch[..width.len()]), name)?;
        self.cursor.ensure(width.len() + len)?;
        self.cursor.read(&mut scratch[..width.len()])?;
        self.cursor.read(&mut buf[..len])?;
        Ok(len)
    }
}

impl Serializer for Reader<'_> {
    fn direction(&self) -> Direction {
        Direction::Decode
    }

    fn is_valid(&self) -> bool {
        self.latch.is_valid()
    }

    fn invalidate(&mut self, field: &'static str, error: Error) {
        self.latch.fail(field, error);
    }

    fn bool(&mut self, value: &mut bool, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let mut byte = [0u8; 1];
        let result = self.cursor.read(&mut byte);
        self.latch.record(name, result)?;
        *value = byte[0] != 0;
        Ok(())
    }

    fn bounded<T: Integer>(
        &mut self,
        value: &mut T,
        name: &'static str,
        min: T,
        max: T,
    ) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.read_bounded(Bounds::new(min..=max), name);
        *value = self.latch.record(name, result)?;
        Ok(())
    }

    fn f32(&mut self, value: &mut f32, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let mut bytes = [0u8; 4];
        let result = self.cursor.read(&mut bytes);
        self.latch.record(name, result)?;
        *value = f32::from_be_bytes(bytes);
        Ok(())
    }

    fn f64(&mut self, value: &mut f64, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let mut bytes = [0u8; 8];
        let result = self.cursor.read(&mut bytes);
        self.latch.record(name, result)?;
        *value = f64::from_be_bytes(bytes);
        Ok(())
    }

    fn bytes(
        &mut self,
        buf: &mut [u8],
        len: &mut usize,
        _kind: Kind,
        name: &'static str,
    ) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.read_bytes(buf, name);
        *len = self.latch.record(name, result)?;
        Ok(())
    }

    fn size(&self) -> usize {
        self.cursor.position()
    }

    fn capacity(&self) -> usize {
        self.cursor.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_nonzero_is_true() {
        let buf = [0x00, 0x01, 0x7F, 0xFF];
        let mut reader = Reader::new(&buf);
        let mut expected = [false, true, true, true].into_iter();
        for _ in 0..4 {
            let mut value = false;
            reader.bool(&mut value, "b").unwrap();
            assert_eq!(Some(value), expected.next());
        }
        assert_eq!(reader.finish(), Ok(4));
    }

    #[test]
    fn test_bounded_rejects_wire_out_of_range() {
        // Range [0, 100] is one byte wide; 200 fits the width but not the range.
        let buf = [200u8];
        let mut reader = Reader::new(&buf);
        let mut value = 7u32;
        assert_eq!(
            reader.bounded(&mut value, "hp", 0, 100),
            Err(Error::OutOfRange("hp"))
        );
        assert_eq!(value, 7);
        assert_eq!(reader.size(), 0);
    }

    #[test]
    fn test_bounded_adds_min() {
        let buf = [0x00, 0x05];
        let mut reader = Reader::new(&buf);
        let mut value = 0i16;
        reader.bounded(&mut value, "v", -10, 300).unwrap();
        assert_eq!(value, -5);
    }

    #[test]
    fn test_bytes_declared_length_exceeds_remaining() {
        // Prefix says 10 bytes but only 4 follow.
        let buf = [10u8, 1, 2, 3, 4];
        let mut reader = Reader::new(&buf);
        let mut dst = [0u8; 16];
        let mut len = 0;
        assert!(matches!(
            reader.bytes(&mut dst, &mut len, Kind::Opaque, "blob"),
            Err(Error::EndOfBuffer { .. })
        ));
        assert_eq!(len, 0);
        assert_eq!(dst, [0u8; 16]);
        assert_eq!(reader.size(), 0);
    }

    #[test]
    fn test_bytes_declared_length_exceeds_destination() {
        let buf = [5u8, 1, 2, 3, 4, 5];
        let mut reader = Reader::new(&buf);
        let mut dst = [0u8; 4];
        let mut len = 0;
        assert_eq!(
            reader.bytes(&mut dst, &mut len, Kind::Opaque, "blob"),
            Err(Error::OutOfRange("blob"))
        );
    }

    #[test]
    fn test_float_failure_leaves_value() {
        let buf = [0x3F, 0x80];
        let mut reader = Reader::new(&buf);
        let mut value = 2.5f32;
        assert!(reader.f32(&mut value, "f").is_err());
        assert_eq!(value, 2.5);
    }
}
