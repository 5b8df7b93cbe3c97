//! Size-counting serializer.

use crate::{
    bounded::{Bounds, Integer},
    latch::Latch,
    Direction, Error, Kind, Serializer,
};

/// Counts the bytes a [crate::Writer] would produce without writing anything.
///
/// An optional limit (typically the payload budget of a datagram) makes the measurer fail
/// exactly where a writer over a buffer of that size would.
#[derive(Clone, Debug)]
pub struct Measurer {
    size: usize,
    limit: Option<usize>,
    latch: Latch,
}

impl Measurer {
    /// Creates a measurer. `None` means unlimited.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            size: 0,
            limit,
            latch: Latch::new(),
        }
    }

    /// Returns the measured size, or the error that first invalidated the measurer.
    pub fn finish(self) -> Result<usize, Error> {
        self.latch.finish(self.size)
    }

    fn advance(&mut self, count: usize) -> Result<(), Error> {
        let remaining = self.capacity() - self.size;
        if count > remaining {
            return Err(Error::EndOfBuffer {
                needed: count,
                remaining,
            });
        }
        self.size += count;
        Ok(())
    }
}

impl Default for Measurer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Serializer for Measurer {
    fn direction(&self) -> Direction {
        Direction::Encode
    }

    fn is_valid(&self) -> bool {
        self.latch.is_valid()
    }

    fn invalidate(&mut self, field: &'static str, error: Error) {
        self.latch.fail(field, error);
    }

    fn bool(&mut self, _value: &mut bool, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.advance(1);
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
        let result = bounds
            .offset(*value, name)
            .and_then(|_| self.advance(bounds.width().len()));
        self.latch.record(name, result)
    }

    fn f32(&mut self, _value: &mut f32, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.advance(4);
        self.latch.record(name, result)
    }

    fn f64(&mut self, _value: &mut f64, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        let result = self.advance(8);
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
        let result = if *len > buf.len() {
            Err(Error::LengthExceeded(*len, buf.len()))
        } else {
            let prefix = Bounds::new(0..=buf.len()).width().len();
            self.advance(prefix + *len)
        };
        self.latch.record(name, result)
    }

    fn size(&self) -> usize {
        self.size
    }

    fn capacity(&self) -> usize {
        self.limit.unwrap_or(usize::MAX)
    }
}
