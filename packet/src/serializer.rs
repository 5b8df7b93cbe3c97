//! The field-level interface shared by every serializer.
//!
//! A type describes its wire layout once, in [Serialize::serialize], as an ordered list of
//! field calls. The same list encodes when run against a [crate::Writer] and decodes when run
//! against a [crate::Reader]; alternate serializers ([crate::Measurer], [crate::Describer]) and
//! decorators ([crate::TypeValidating], [crate::TrackChanges]) reuse it unchanged.

use crate::{bounded::Integer, Describer, Error, Measurer, Reader, Writer};
use bytes::BytesMut;

/// Which side of a field call is the source of truth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Values are read from the object and written to the buffer.
    Encode,
    /// Values are read from the buffer and written to the object.
    Decode,
}

/// Interpretation of a variable-length field.
///
/// The codec transmits both kinds identically. The kind is carried for serializers that
/// care (type tags, debug output) and for callers that validate contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Opaque,
    Utf8,
}

/// A serializer over one packet.
///
/// Every operation fails once any earlier operation on the same instance has failed, so a
/// field list may ignore intermediate results and check only the outcome of the last call
/// (or the serializer's final status). Operations that fail leave the field's value and the
/// buffer untouched.
pub trait Serializer: Sized {
    /// Returns the direction fixed at construction.
    fn direction(&self) -> Direction;

    /// Returns true if no operation has failed.
    fn is_valid(&self) -> bool;

    /// Marks the serializer as failed.
    ///
    /// Used by callers and decorators that detect a failure the codec cannot (a type tag
    /// mismatch, invalid text). Has no effect if the serializer already failed.
    fn invalidate(&mut self, field: &'static str, error: Error);

    /// Serializes a boolean as a single byte.
    ///
    /// Any nonzero byte decodes as `true`.
    fn bool(&mut self, value: &mut bool, name: &'static str) -> Result<(), Error>;

    /// Serializes an integer declared to lie within `[min, max]`.
    ///
    /// The wire width is selected from `max - min` alone (see [crate::Width]).
    fn bounded<T: Integer>(
        &mut self,
        value: &mut T,
        name: &'static str,
        min: T,
        max: T,
    ) -> Result<(), Error>;

    /// Serializes an `f32` as 4 big-endian bytes.
    fn f32(&mut self, value: &mut f32, name: &'static str) -> Result<(), Error>;

    /// Serializes an `f64` as 8 big-endian bytes.
    fn f64(&mut self, value: &mut f64, name: &'static str) -> Result<(), Error>;

    /// Serializes the first `*len` bytes of `buf` behind a length prefix.
    ///
    /// The prefix is a bounded integer over `[0, buf.len()]`, so a decoded length can never
    /// exceed the destination. On decode, `*len` is set to the received length.
    fn bytes(
        &mut self,
        buf: &mut [u8],
        len: &mut usize,
        kind: Kind,
        name: &'static str,
    ) -> Result<(), Error>;

    /// Opens a nested object. Writes nothing to the wire.
    fn begin_object(&mut self, _name: &'static str) -> Result<(), Error> {
        self.status()
    }

    /// Closes a nested object. Writes nothing to the wire.
    fn end_object(&mut self, _name: &'static str) -> Result<(), Error> {
        self.status()
    }

    /// Bytes written (encode) or consumed (decode) so far.
    fn size(&self) -> usize;

    /// Total bytes available to the serializer.
    fn capacity(&self) -> usize;

    /// Fails with [Error::Invalidated] if the serializer already failed.
    fn status(&self) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::Invalidated)
        }
    }

    /// Serializes an integer over its type's full range.
    ///
    /// Platform-width integers use the full range of their 64-bit counterpart, so the
    /// encoding does not depend on the host's word size. Decoding a value the host cannot
    /// represent fails with [Error::OutOfRange].
    fn integer<T: Integer>(&mut self, value: &mut T, name: &'static str) -> Result<(), Error> {
        let mut wire = value.widen();
        self.bounded(
            &mut wire,
            name,
            <T::Wire as Integer>::MIN,
            <T::Wire as Integer>::MAX,
        )?;
        let Some(narrowed) = T::narrow(wire) else {
            let error = Error::OutOfRange(name);
            self.invalidate(name, error.clone());
            return Err(error);
        };
        *value = narrowed;
        Ok(())
    }

    /// Serializes a nested object between [Serializer::begin_object] and
    /// [Serializer::end_object].
    fn object<T: Serialize + ?Sized>(
        &mut self,
        value: &mut T,
        name: &'static str,
    ) -> Result<(), Error> {
        self.begin_object(name)?;
        value.serialize(self)?;
        self.end_object(name)
    }
}

/// Types with a wire layout.
pub trait Serialize {
    /// Runs this type's field list against `serializer`.
    fn serialize<S: Serializer>(&mut self, serializer: &mut S) -> Result<(), Error>;
}

/// Extension trait providing whole-packet helpers for any [Serialize] type.
pub trait SerializeExt: Serialize {
    /// Encodes into a new buffer of `capacity` bytes, truncated to the encoded size.
    fn encode(&mut self, capacity: usize) -> Result<BytesMut, Error> {
        let mut buf = BytesMut::zeroed(capacity);
        let mut writer = Writer::new(&mut buf[..]);
        self.serialize(&mut writer)?;
        let size = writer.finish()?;
        buf.truncate(size);
        Ok(buf)
    }

    /// Returns the number of bytes [SerializeExt::encode] would produce.
    fn encoded_size(&mut self) -> Result<usize, Error> {
        let mut measurer = Measurer::default();
        self.serialize(&mut measurer)?;
        measurer.finish()
    }

    /// Decodes a value from `buf`, ensuring the buffer is fully consumed.
    fn decode(buf: &[u8]) -> Result<Self, Error>
    where
        Self: Default,
    {
        let mut value = Self::default();
        let mut reader = Reader::new(buf);
        value.serialize(&mut reader)?;
        let consumed = reader.finish()?;
        if consumed < buf.len() {
            return Err(Error::ExtraData(buf.len() - consumed));
        }
        Ok(value)
    }

    /// Renders the value's fields as debug text.
    fn describe(&mut self) -> Result<String, Error> {
        let mut describer = Describer::new();
        self.serialize(&mut describer)?;
        describer.finish()
    }
}

// Automatically implement `SerializeExt` for types that implement `Serialize`.
impl<T: Serialize + ?Sized> SerializeExt for T {}

impl<S: Serializer> Serializer for &mut S {
    fn direction(&self) -> Direction {
        (**self).direction()
    }

    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn invalidate(&mut self, field: &'static str, error: Error) {
        (**self).invalidate(field, error)
    }

    fn bool(&mut self, value: &mut bool, name: &'static str) -> Result<(), Error> {
        (**self).bool(value, name)
    }

    fn bounded<T: Integer>(
        &mut self,
        value: &mut T,
        name: &'static str,
        min: T,
        max: T,
    ) -> Result<(), Error> {
        (**self).bounded(value, name, min, max)
    }

    fn f32(&mut self, value: &mut f32, name: &'static str) -> Result<(), Error> {
        (**self).f32(value, name)
    }

    fn f64(&mut self, value: &mut f64, name: &'static str) -> Result<(), Error> {
        (**self).f64(value, name)
    }

    fn bytes(
        &mut self,
        buf: &mut [u8],
        len: &mut usize,
        kind: Kind,
        name: &'static str,
    ) -> Result<(), Error> {
        (**self).bytes(buf, len, kind, name)
    }

    fn begin_object(&mut self, name: &'static str) -> Result<(), Error> {
        (**self).begin_object(name)
    }

    fn end_object(&mut self, name: &'static str) -> Result<(), Error> {
        (**self).end_object(name)
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }
}
