//! Type-tag validation layered over another serializer.
//!
//! Each field is preceded by a one-byte [Tag] naming its type. A receiver whose field list
//! disagrees with the sender's (a schema drift, a misrouted packet) fails on the first
//! divergent field instead of silently misinterpreting the remainder.

use crate::{bounded::Integer, Direction, Error, Kind, Serializer};

/// Type tag written ahead of each field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Bool = 1,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Opaque,
    Utf8,
    BeginObject,
    EndObject,
}

impl Tag {
    const FIRST: u8 = Tag::Bool as u8;
    const LAST: u8 = Tag::EndObject as u8;
}

impl From<Kind> for Tag {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Opaque => Tag::Opaque,
            Kind::Utf8 => Tag::Utf8,
        }
    }
}

/// Wraps a serializer, tagging every field with its type.
///
/// Tags travel through the inner serializer's bounded-integer path, so they obey the same
/// capacity and validity rules as any other field.
pub struct TypeValidating<S> {
    inner: S,
}

impl<S: Serializer> TypeValidating<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped serializer.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Returns a reference to the wrapped serializer.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn tag(&mut self, expected: Tag, name: &'static str) -> Result<(), Error> {
        let mut found = expected as u8;
        self.inner.bounded(&mut found, name, Tag::FIRST, Tag::LAST)?;
        if found != expected as u8 {
            let error = Error::TypeMismatch {
                field: name,
                expected: expected as u8,
                found,
            };
            self.inner.invalidate(name, error.clone());
            return Err(error);
        }
        Ok(())
    }
}

impl<S: Serializer> Serializer for TypeValidating<S> {
    fn direction(&self) -> Direction {
        self.inner.direction()
    }

    fn is_valid(&self) -> bool {
        self.inner.is_valid()
    }

    fn invalidate(&mut self, field: &'static str, error: Error) {
        self.inner.invalidate(field, error);
    }

    fn bool(&mut self, value: &mut bool, name: &'static str) -> Result<(), Error> {
        self.tag(Tag::Bool, name)?;
        self.inner.bool(value, name)
    }

    fn bounded<T: Integer>(
        &mut self,
        value: &mut T,
        name: &'static str,
        min: T,
        max: T,
    ) -> Result<(), Error> {
        self.tag(T::TAG, name)?;
        self.inner.bounded(value, name, min, max)
    }

    fn f32(&mut self, value: &mut f32, name: &'static str) -> Result<(), Error> {
        self.tag(Tag::F32, name)?;
        self.inner.f32(value, name)
    }

    fn f64(&mut self, value: &mut f64, name: &'static str) -> Result<(), Error> {
        self.tag(Tag::F64, name)?;
        self.inner.f64(value, name)
    }

    fn bytes(
        &mut self,
        buf: &mut [u8],
        len: &mut usize,
        kind: Kind,
        name: &'static str,
    ) -> Result<(), Error> {
        self.tag(kind.into(), name)?;
        self.inner.bytes(buf, len, kind, name)
    }

    fn begin_object(&mut self, name: &'static str) -> Result<(), Error> {
        self.tag(Tag::BeginObject, name)?;
        self.inner.begin_object(name)
    }

    fn end_object(&mut self, name: &'static str) -> Result<(), Error> {
        self.tag(Tag::EndObject, name)?;
        self.inner.end_object(name)
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}
