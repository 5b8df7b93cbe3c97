//! Debug-text serializer.

use crate::{
    bounded::{Bounds, Integer},
    latch::Latch,
    Direction, Error, Kind, Serializer,
};
use std::fmt::Write as _;

/// Renders an object's fields as `name=value` text.
///
/// Nested objects render as `name{...}`. Opaque bytes render as lowercase hex and UTF-8
/// bytes render quoted. Bounds are still enforced, so a value a [crate::Writer] would reject
/// invalidates the describer too.
///
/// ```
/// use commonware_packet::{Describer, Serializer};
///
/// let mut describer = Describer::new();
/// describer.begin_object("unit").unwrap();
/// describer.bounded(&mut 3u8, "team", 0, 3).unwrap();
/// describer.bool(&mut false, "hidden").unwrap();
/// describer.end_object("unit").unwrap();
/// assert_eq!(describer.finish().unwrap(), "unit{team=3 hidden=false}");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Describer {
    out: String,
    separate: bool,
    latch: Latch,
}

impl Describer {
    /// Creates an empty describer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rendered text, or the error that first invalidated the describer.
    pub fn finish(self) -> Result<String, Error> {
        self.latch.finish(self.out)
    }

    fn field(&mut self, name: &str, value: impl std::fmt::Display) {
        if self.separate {
            self.out.push(' ');
        }
        // Writing to a String cannot fail.
        let _ = write!(self.out, "{name}={value}");
        self.separate = true;
    }
}

impl Serializer for Describer {
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
        self.field(name, *value);
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
        let result = Bounds::new(min..=max).offset(*value, name);
        self.latch.record(name, result)?;
        self.field(name, format_args!("{value:?}"));
        Ok(())
    }

    fn f32(&mut self, value: &mut f32, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        self.field(name, *value);
        Ok(())
    }

    fn f64(&mut self, value: &mut f64, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        self.field(name, *value);
        Ok(())
    }

    fn bytes(
        &mut self,
        buf: &mut [u8],
        len: &mut usize,
        kind: Kind,
        name: &'static str,
    ) -> Result<(), Error> {
        self.latch.check()?;
        let Some(contents) = buf.get(..*len) else {
            let error = Error::LengthExceeded(*len, buf.len());
            self.latch.fail(name, error.clone());
            return Err(error);
        };
        let rendered = match kind {
            Kind::Opaque => contents.iter().fold(String::new(), |mut hex, byte| {
                let _ = write!(hex, "{byte:02x}");
                hex
            }),
            Kind::Utf8 => format!("{:?}", String::from_utf8_lossy(contents)),
        };
        self.field(name, rendered);
        Ok(())
    }

    fn begin_object(&mut self, name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        if self.separate {
            self.out.push(' ');
        }
        self.out.push_str(name);
        self.out.push('{');
        self.separate = false;
        Ok(())
    }

    fn end_object(&mut self, _name: &'static str) -> Result<(), Error> {
        self.latch.check()?;
        self.out.push('}');
        self.separate = true;
        Ok(())
    }

    fn size(&self) -> usize {
        self.out.len()
    }

    fn capacity(&self) -> usize {
        usize::MAX
    }
}
