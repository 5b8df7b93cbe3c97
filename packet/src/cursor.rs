//! Bounds-checked cursor over a caller-owned byte buffer.
//!
//! [Cursor] is the only type that touches raw buffer memory. Every copy is checked against
//! the buffer's capacity before any byte moves, so a failed copy leaves both the buffer and
//! the position untouched.

use crate::Error;

/// Tracks the current offset into a fixed-capacity buffer.
///
/// The position is monotonic and never exceeds the capacity.
#[derive(Debug)]
pub struct Cursor<B> {
    buf: B,
    position: usize,
}

impl<B: AsRef<[u8]>> Cursor<B> {
    /// Creates a cursor positioned at the start of `buf`.
    pub fn new(buf: B) -> Self {
        Self { buf, position: 0 }
    }

    /// Returns the current offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the total number of bytes the buffer can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.as_ref().len()
    }

    /// Returns the number of bytes between the position and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.position
    }

    /// Returns the underlying buffer.
    pub fn buffer(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Returns the bytes between the start of the buffer and the position.
    pub fn filled(&self) -> &[u8] {
        &self.buf.as_ref()[..self.position]
    }

    /// Ensures `count` more bytes fit before the end of the buffer.
    #[inline]
    fn reserve(&self, count: usize) -> Result<usize, Error> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(Error::EndOfBuffer {
                needed: count,
                remaining,
            });
        }
        Ok(self.position + count)
    }

    /// Fails unless `count` more bytes fit before the end of the buffer.
    pub fn ensure(&self, count: usize) -> Result<(), Error> {
        self.reserve(count).map(|_| ())
    }

    /// Copies `dst.len()` bytes out of the buffer without advancing the position.
    pub fn peek(&self, dst: &mut [u8]) -> Result<(), Error> {
        let end = self.reserve(dst.len())?;
        dst.copy_from_slice(&self.buf.as_ref()[self.position..end]);
        Ok(())
    }

    /// Copies `dst.len()` bytes out of the buffer and advances the position.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<(), Error> {
        self.peek(dst)?;
        self.position += dst.len();
        Ok(())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Cursor<B> {
    /// Copies `src` into the buffer and advances the position.
    pub fn write(&mut self, src: &[u8]) -> Result<(), Error> {
        let end = self.reserve(src.len())?;
        self.buf.as_mut()[self.position..end].copy_from_slice(src);
        self.position = end;
        Ok(())
    }
}
