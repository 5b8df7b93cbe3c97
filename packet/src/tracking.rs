//! Delta encoding layered over another serializer.
//!
//! Every field is preceded by a one-byte presence flag. On encode, a field is transmitted
//! only if it differs from the value recorded in a [Snapshot] the last time the same field
//! was transmitted. On decode, absent fields are left as they are, so the receiver must
//! apply the packet to the object it decoded the previous packet into.
//!
//! A field is identified by its position within the enclosing object (each
//! [Serializer::begin_object] opens a new numbering) together with its name and type. If
//! the field found at a position is not the one recorded there, the layout of that object
//! changed (an [Option] appeared or vanished) and every remaining field of the object is
//! transmitted. Fields outside the object keep their positions and are compared as usual.
//!
//! The snapshot is only updated when the whole packet serializes successfully (see
//! [TrackChanges::into_inner]). A packet that fails part way leaves it as it was, so
//! re-encoding after a failure transmits everything the receiver has not seen.

use crate::{bounded::Integer, validating::Tag, Direction, Error, Kind, Serializer};
use bytes::Bytes;
use std::collections::HashMap;
use tracing::trace;

/// Recorded value of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Recorded {
    Scalar(u64),
    Bytes(Bytes),
}

/// What was last seen at a field position.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Entry {
    name: &'static str,
    tag: Tag,
    /// `None` for object boundaries.
    value: Option<Recorded>,
}

impl Entry {
    fn is(&self, name: &'static str, tag: Tag) -> bool {
        self.name == name && self.tag == tag
    }
}

/// Last transmitted value of every field, keyed by position path.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    fields: HashMap<Vec<usize>, Entry>,
}

impl Snapshot {
    /// Creates an empty snapshot. Every field compares as changed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all recorded values, forcing the next encode to transmit every field.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Returns the number of fields with a recorded value.
    pub fn len(&self) -> usize {
        self.fields
            .values()
            .filter(|entry| entry.value.is_some())
            .count()
    }

    /// Returns true if no field has a recorded value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Wraps a serializer, transmitting only fields that changed since the [Snapshot].
pub struct TrackChanges<'a, S> {
    inner: S,
    snapshot: &'a mut Snapshot,
    /// Contents of the snapshot once this packet completes.
    pending: HashMap<Vec<usize>, Entry>,
    /// Next position in each open object, outermost first.
    path: Vec<usize>,
    /// Whether each open object's layout has diverged from the snapshot.
    diverged: Vec<bool>,
}

impl<'a, S: Serializer> TrackChanges<'a, S> {
    /// Wraps `inner`, comparing against and updating `snapshot`.
    pub fn new(inner: S, snapshot: &'a mut Snapshot) -> Self {
        Self {
            inner,
            snapshot,
            pending: HashMap::new(),
            path: vec![0],
            diverged: vec![false],
        }
    }

    /// Returns the wrapped serializer.
    ///
    /// If the wrapped serializer is still valid, the fields seen by this packet replace the
    /// snapshot. Otherwise the snapshot is left untouched.
    pub fn into_inner(self) -> S {
        if self.inner.is_valid() {
            self.snapshot.fields = self.pending;
        }
        self.inner
    }

    /// Takes the next position in the current object.
    ///
    /// Returns the position and the recorded entry, if it still describes this field.
    fn claim(&mut self, name: &'static str, tag: Tag) -> (Vec<usize>, Option<Entry>) {
        let key = self.path.clone();
        if let Some(next) = self.path.last_mut() {
            *next += 1;
        }
        let recorded = self
            .snapshot
            .fields
            .get(&key)
            .filter(|entry| entry.is(name, tag));
        let Some(diverged) = self.diverged.last_mut() else {
            return (key, None);
        };
        if recorded.is_none() {
            *diverged = true;
        }
        if *diverged {
            return (key, None);
        }
        (key, recorded.cloned())
    }

    /// Serializes the presence flag of the next field, then the field itself if present.
    ///
    /// `current` is the field's value on encode, or `None` if it cannot be recorded (in
    /// which case the field is always transmitted and the inner serializer reports why).
    fn field<F>(
        &mut self,
        name: &'static str,
        tag: Tag,
        current: Option<Recorded>,
        transmit: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut S) -> Result<Recorded, Error>,
    {
        self.inner.status()?;
        let (key, recorded) = self.claim(name, tag);
        let previous = recorded.as_ref().and_then(|entry| entry.value.as_ref());
        let mut present = match self.inner.direction() {
            Direction::Encode => current.is_none() || previous != current.as_ref(),
            Direction::Decode => false,
        };
        self.inner.bool(&mut present, name)?;
        if present {
            let value = transmit(&mut self.inner)?;
            let entry = Entry {
                name,
                tag,
                value: Some(value),
            };
            self.pending.insert(key, entry);
        } else {
            trace!(field = name, position = ?key, "unchanged field skipped");
            if let Some(entry) = recorded {
                self.pending.insert(key, entry);
            }
        }
        Ok(())
    }
}

impl<S: Serializer> Serializer for TrackChanges<'_, S> {
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
        let current = Recorded::Scalar(u64::from(*value));
        self.field(name, Tag::Bool, Some(current), |inner| {
            inner.bool(value, name)?;
            Ok(Recorded::Scalar(u64::from(*value)))
        })
    }

    fn bounded<T: Integer>(
        &mut self,
        value: &mut T,
        name: &'static str,
        min: T,
        max: T,
    ) -> Result<(), Error> {
        let current = Recorded::Scalar(value.to_bits());
        self.field(name, T::TAG, Some(current), |inner| {
            inner.bounded(value, name, min, max)?;
            Ok(Recorded::Scalar(value.to_bits()))
        })
    }

    fn f32(&mut self, value: &mut f32, name: &'static str) -> Result<(), Error> {
        let current = Recorded::Scalar(u64::from(value.to_bits()));
        self.field(name, Tag::F32, Some(current), |inner| {
            inner.f32(value, name)?;
            Ok(Recorded::Scalar(u64::from(value.to_bits())))
        })
    }

    fn f64(&mut self, value: &mut f64, name: &'static str) -> Result<(), Error> {
        let current = Recorded::Scalar(value.to_bits());
        self.field(name, Tag::F64, Some(current), |inner| {
            inner.f64(value, name)?;
            Ok(Recorded::Scalar(value.to_bits()))
        })
    }

    fn bytes(
        &mut self,
        buf: &mut [u8],
        len: &mut usize,
        kind: Kind,
        name: &'static str,
    ) -> Result<(), Error> {
        let current = match self.inner.direction() {
            Direction::Encode => buf
                .get(..*len)
                .map(|contents| Recorded::Bytes(Bytes::copy_from_slice(contents))),
            Direction::Decode => None,
        };
        self.field(name, kind.into(), current, |inner| {
            inner.bytes(buf, len, kind, name)?;
            Ok(Recorded::Bytes(Bytes::copy_from_slice(&buf[..*len])))
        })
    }

    fn begin_object(&mut self, name: &'static str) -> Result<(), Error> {
        self.inner.begin_object(name)?;
        let (key, recorded) = self.claim(name, Tag::BeginObject);
        let entry = Entry {
            name,
            tag: Tag::BeginObject,
            value: None,
        };
        self.pending.insert(key, entry);
        self.path.push(0);
        self.diverged.push(recorded.is_none());
        Ok(())
    }

    fn end_object(&mut self, name: &'static str) -> Result<(), Error> {
        self.inner.end_object(name)?;
        if self.path.len() > 1 {
            self.path.pop();
            self.diverged.pop();
        }
        Ok(())
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reader, Serialize, Writer};

    fn encode(
        snapshot: &mut Snapshot,
        hp: &mut u32,
        name: &mut [u8; 8],
        name_len: &mut usize,
    ) -> Vec<u8> {
        let mut buf = [0u8; 32];
        let mut writer = TrackChanges::new(Writer::new(&mut buf), snapshot);
        writer.bounded(hp, "hp", 0, 100).unwrap();
        writer.bytes(name, name_len, Kind::Utf8, "name").unwrap();
        let written = writer.into_inner().finish().unwrap();
        buf[..written].to_vec()
    }

    #[test]
    fn test_unchanged_fields_skipped() {
        let mut snapshot = Snapshot::new();
        let mut hp = 50u32;
        let mut name = *b"ogre\0\0\0\0";
        let mut name_len = 4;

        let first = encode(&mut snapshot, &mut hp, &mut name, &mut name_len);
        assert_eq!(first, vec![1, 50, 1, 4, b'o', b'g', b'r', b'e']);
        assert_eq!(snapshot.len(), 2);

        hp = 49;
        let second = encode(&mut snapshot, &mut hp, &mut name, &mut name_len);
        assert_eq!(second, vec![1, 49, 0]);

        let third = encode(&mut snapshot, &mut hp, &mut name, &mut name_len);
        assert_eq!(third, vec![0, 0]);

        snapshot.clear();
        let fourth = encode(&mut snapshot, &mut hp, &mut name, &mut name_len);
        assert_eq!(fourth.len(), 8);
    }

    #[test]
    fn test_decode_applies_subset() {
        let mut received = Snapshot::new();
        let mut hp = 70u32;
        let mut name = *b"troll\0\0\0";
        let mut name_len = 5;

        let packet = [1u8, 49, 0];
        let mut reader = TrackChanges::new(Reader::new(&packet), &mut received);
        reader.bounded(&mut hp, "hp", 0, 100).unwrap();
        reader
            .bytes(&mut name, &mut name_len, Kind::Utf8, "name")
            .unwrap();
        assert_eq!(reader.into_inner().finish(), Ok(3));
        assert_eq!(hp, 49);
        assert_eq!(&name[..name_len], b"troll");
        assert_eq!(received.len(), 1);
    }

    #[test]
    fn test_failure_propagates() {
        let mut snapshot = Snapshot::new();
        let mut buf = [0u8; 1];
        let mut writer = TrackChanges::new(Writer::new(&mut buf), &mut snapshot);
        assert!(writer.bounded(&mut 5u8, "a", 0, 9).is_err());
        assert_eq!(writer.bool(&mut true, "b"), Err(Error::Invalidated));
        assert!(!writer.into_inner().is_valid());
        assert!(snapshot.is_empty());
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Inner {
        a: u8,
    }

    impl Serialize for Inner {
        fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<(), Error> {
            s.bounded(&mut self.a, "a", 0, 100)
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Outer {
        inner: Option<Inner>,
        b: u8,
    }

    impl Serialize for Outer {
        fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<(), Error> {
            // The option is inlined so its contents share positions with `b`.
            self.inner.serialize(s)?;
            s.bounded(&mut self.b, "b", 0, 100)
        }
    }

    fn send(
        value: &mut Outer,
        snapshot: &mut Snapshot,
        capacity: usize,
    ) -> Result<Vec<u8>, Error> {
        let mut buf = vec![0u8; capacity];
        let mut writer = TrackChanges::new(Writer::new(&mut buf), snapshot);
        let _ = value.serialize(&mut writer);
        let written = writer.into_inner().finish()?;
        Ok(buf[..written].to_vec())
    }

    fn apply(value: &mut Outer, snapshot: &mut Snapshot, packet: &[u8]) {
        let mut reader = TrackChanges::new(Reader::new(packet), snapshot);
        value.serialize(&mut reader).unwrap();
        assert_eq!(reader.into_inner().finish(), Ok(packet.len()));
    }

    #[test]
    fn test_layout_change_transmits_shifted_fields() {
        let mut sent = Snapshot::new();
        let mut received = Snapshot::new();
        let mut receiver = Outer::default();

        let states = [
            Outer {
                inner: Some(Inner { a: 5 }),
                b: 7,
            },
            // `b` now sits where `a` used to, and equals `a`'s recorded value.
            Outer { inner: None, b: 5 },
            // `b` returns to its old position with its old value, which the receiver
            // no longer holds.
            Outer {
                inner: Some(Inner { a: 5 }),
                b: 7,
            },
            Outer { inner: None, b: 7 },
        ];
        for mut sender in states {
            let packet = send(&mut sender, &mut sent, 64).unwrap();
            apply(&mut receiver, &mut received, &packet);
            assert_eq!(receiver, sender);
        }
    }

    #[test]
    fn test_sibling_object_keeps_position() {
        #[derive(Debug, Default, PartialEq)]
        struct Scoped {
            inner: Option<Inner>,
            b: u8,
        }

        impl Serialize for Scoped {
            fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<(), Error> {
                s.object(&mut self.inner, "inner")?;
                s.bounded(&mut self.b, "b", 0, 100)
            }
        }

        let mut snapshot = Snapshot::new();
        let mut buf = [0u8; 16];
        let mut value = Scoped {
            inner: Some(Inner { a: 1 }),
            b: 2,
        };
        let mut writer = TrackChanges::new(Writer::new(&mut buf), &mut snapshot);
        value.serialize(&mut writer).unwrap();
        assert_eq!(writer.into_inner().finish(), Ok(6));

        // Dropping the option changes its presence flag only; `b` is still recognized.
        value.inner = None;
        let mut writer = TrackChanges::new(Writer::new(&mut buf), &mut snapshot);
        value.serialize(&mut writer).unwrap();
        assert_eq!(writer.into_inner().finish(), Ok(3));
        assert_eq!(&buf[..3], &[1, 0, 0]);
    }

    #[test]
    fn test_failed_packet_leaves_snapshot() {
        let mut sent = Snapshot::new();
        let mut received = Snapshot::new();
        let mut sender = Outer {
            inner: Some(Inner { a: 9 }),
            b: 9,
        };

        // Presence and `a` fit, `b` does not.
        assert!(matches!(
            send(&mut sender, &mut sent, 4),
            Err(Error::EndOfBuffer { .. })
        ));
        assert!(sent.is_empty());

        let packet = send(&mut sender, &mut sent, 64).unwrap();
        assert_eq!(packet, vec![1, 1, 1, 9, 1, 9]);

        let mut receiver = Outer::default();
        apply(&mut receiver, &mut received, &packet);
        assert_eq!(receiver, sender);
    }
}
