//! Encode-direction serializer.

use crate::{
    bounded::{Bounds, Integer},
    cursor::Cursor,
    latch::Latch,
    Direction, Error, Kind, Serializer,
};

/// Writes fields from an object into a caller-owned buffer.
///
/// # Example
///
/// ```
/// use commonware_packet::{Serializer, Writer};
///
/// let mut buf = [0u8; 8];
/// let mut writer = Writer::new(&mut buf);
/// writer.bounded(&mut 42u32, "hp", 0, 100).unwrap();
/// writer.bool(&mut true, "alive").unwrap();
/// assert_eq!(writer.finish(), Ok(2));
/// assert_eq!(&buf[..2], &[42, 1]);
/// ```
pub struct Writer<'a> {
    cursor: Cursor<&'a mut [u8]>,
    latch: Latch,
}

impl<'a> Writer<'a> {
    /// Creates a writer over `buf`. The buffer's length is the packet capacity.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            cursor: Cursor::new(buf),
            latch: Latch::new(),
        }
    }

    /// Returns the whole buffer.
    pub fn buffer(&self) -> &[u8] {
        self.cursor.buffer()
    }

    /// Returns the bytes written so far.
    pub fn written(&self) -> &[u8] {
        self.cursor.filled()
    }

    /// Returns the number of bytes written, or the error that first invalidated the writer.
    pub fn finish(self) -> Result<usize, Error> {
        self.latch.finish(self.cursor.position())
    }
}

impl Serializer for Writer<'_> {
    fn direction(&self) -> Direction {
        Direction::Encode
    }

    fn is_valid(&self) -> bool {
        self.latch.is_valid()
    }

    fn invalidate(&mut self, field: &'static str, error: Error) {
        self.latch.fail(field, error);
    }

    fn bool(&mut self, value: &mut bool, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.cursor.write(&[u8::from(*value)]);
        self.latch.record(name, result)
    }

    fn bounded<T: Integer>(
        &mut self,
        value: &mut T,
        name: &'static str,
        min: T,
        max: T,
    ) -> Result<(), Error> {
        self.latch.check()?;
        let bounds = Bounds::new(min..=max);
        let result = bounds.offset(*value, name).and_then(|offset| {
            let width = bounds.width();
            self.cursor.write(&width.pack(offset)[..width.len()])
        });
        self.latch.record(name, result)
    }

    fn f32(&mut self, value: &mut f32, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.cursor.write(&value.to_be_bytes());
        self.latch.record(name, result)
    }

    fn f64(&mut self, value: &mut f64, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.cursor.write(&value.to_be_bytes());
        self.latch.record(name, result)
    }

    fn bytes(
        &mut self,
        buf: &mut [u8],
        len: &mut usize,
        _kind: Kind,
        name: &'static str,
    ) -> Result<(), Error> {
        self.latch.check()?;
        let result = write_bytes(&mut self.cursor, buf, *len, name);
        self.latch.record(name, result)
    }

    fn size(&self) -> usize {
        self.cursor.position()
    }

    fn capacity(&self) -> usize {
        self.cursor.capacity()
    }
}

/// Writes the length prefix and payload together, or neither.
fn write_bytes(
    cursor: &mut Cursor<&mut [u8]>,
    buf: &[u8],
    len: usize,
    name: &'static str,
) -> Result<(), Error> {
    if len > buf.len() {
        return Err(Error::LengthExceeded(len, buf.len()));
    }
    let bounds = Bounds::new(0..=buf.len());
    let width = bounds.width();
    let offset = bounds.offset(len, name)?;
    cursor.ensure(width.len() + len)?;
    cursor.write(&width.pack(offset)[..width.len()])?;
    cursor.write(&buf[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_width_in_range() {
        let mut buf = [0u8; 16];
        let mut writer = Writer::new(&mut buf);
        writer.bounded(&mut 42u32, "v", 0, 100).unwrap();
        assert_eq!(writer.size(), 1);
        writer.bounded(&mut 300u32, "v", 0, 256).unwrap_err();
        assert_eq!(writer.size(), 1);
        assert_eq!(writer.finish(), Err(Error::OutOfRange("v")));
        assert_eq!(buf[0], 42);
    }

    #[test]
    fn test_bounded_offset_from_min() {
        let mut buf = [0u8; 2];
        let mut writer = Writer::new(&mut buf);
        writer.bounded(&mut -5i16, "v", -10, 300).unwrap();
        assert_eq!(writer.finish(), Ok(2));
        assert_eq!(buf, [0x00, 0x05]);
    }

    #[test]
    fn test_inverted_bounds() {
        let mut buf = [0u8; 2];
        let mut writer = Writer::new(&mut buf);
        assert_eq!(
            writer.bounded(&mut 5u8, "v", 6, 4),
            Err(Error::InvalidBounds("v"))
        );
        assert!(!writer.is_valid());
        assert_eq!(writer.size(), 0);
    }

    #[test]
    fn test_bytes_atomic() {
        let mut buf = [0u8; 6];
        let mut writer = Writer::new(&mut buf);
        let mut payload = [7u8; 10];
        let mut len = 10;
        assert!(matches!(
            writer.bytes(&mut payload, &mut len, Kind::Opaque, "blob"),
            Err(Error::EndOfBuffer { .. })
        ));
        assert_eq!(writer.size(), 0);
        assert_eq!(writer.buffer(), &[0u8; 6]);
        assert!(!writer.is_valid());
    }

    #[test]
    fn test_bytes_length_exceeds_source() {
        let mut buf = [0u8; 16];
        let mut writer = Writer::new(&mut buf);
        let mut payload = [1u8; 3];
        let mut len = 4;
        assert_eq!(
            writer.bytes(&mut payload, &mut len, Kind::Opaque, "blob"),
            Err(Error::LengthExceeded(4, 3))
        );
    }

    #[test]
    fn test_float_network_order() {
        let mut buf = [0u8; 12];
        let mut writer = Writer::new(&mut buf);
        writer.f32(&mut 1.0, "f").unwrap();
        writer.f64(&mut 1.0, "d").unwrap();
        assert_eq!(writer.finish(), Ok(12));
        assert_eq!(&buf[..4], &[0x3F, 0x80, 0x00, 0x00]);
        assert_eq!(&buf[4..], &[0x3F, 0xF0, 0, 0, 0, 0, 0, 0]);
    }
}
