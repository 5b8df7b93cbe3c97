//! Serialize replication packets into bounded, bit-exact buffers.
//!
//! # Overview
//!
//! A compact binary serialization library designed to:
//! - Encode objects into a fixed-capacity, caller-owned buffer without allocating
//! - Decode untrusted packets, validating every length and value against a declared contract
//! - Produce identical bytes on every host, regardless of endianness or word size
//!
//! # Field Lists
//!
//! A type describes its layout once by implementing [Serialize]. The same field list is run
//! against a [Writer] to encode and a [Reader] to decode, so the two directions cannot drift.
//! Integers are declared with inclusive bounds and packed into the smallest of 1, 2, 4, or 8
//! bytes that can represent `max - min` (see [Bounds]).
//!
//! # Failure
//!
//! Every serializer latches its first failure. After that, every operation returns
//! [Error::Invalidated] without touching the buffer, so a field list may be written as a
//! straight-line sequence of calls and checked once at the end.
//!
//! # Layering
//!
//! [Measurer] and [Describer] reuse field lists to size and print packets.
//! [TypeValidating] and [TrackChanges] wrap any serializer to add per-field type tags and
//! delta encoding without changing the field list.
//!
//! # Example
//!
//! ```
//! use commonware_packet::{Error, FixedString, Serialize, SerializeExt, Serializer};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Unit {
//!     kind: u8,
//!     health: u32,
//!     heading: f32,
//!     name: FixedString<16>,
//! }
//!
//! impl Serialize for Unit {
//!     fn serialize<S: Serializer>(&mut self, s: &mut S) -> Result<(), Error> {
//!         s.bounded(&mut self.kind, "kind", 0, 5)?;
//!         s.bounded(&mut self.health, "health", 0, 1000)?;
//!         s.f32(&mut self.heading, "heading")?;
//!         s.object(&mut self.name, "name")
//!     }
//! }
//!
//! let mut unit = Unit {
//!     kind: 3,
//!     health: 750,
//!     heading: 1.5,
//!     name: FixedString::new("scout").unwrap(),
//! };
//!
//! // 1 (kind) + 2 (health) + 4 (heading) + 1 (length) + 5 (name)
//! let encoded = unit.encode(64).unwrap();
//! assert_eq!(encoded.len(), 13);
//! assert_eq!(unit.encoded_size().unwrap(), 13);
//!
//! let decoded = Unit::decode(&encoded).unwrap();
//! assert_eq!(decoded, unit);
//! ```

pub mod bounded;
pub mod cursor;
pub mod describer;
pub mod error;
pub mod latch;
pub mod measurer;
pub mod reader;
pub mod serializer;
pub mod tracking;
pub mod types;
pub mod validating;
pub mod writer;

// Re-export main types and traits
pub use bounded::{Bounds, Integer, Width};
pub use describer::Describer;
pub use error::Error;
pub use measurer::Measurer;
pub use reader::Reader;
pub use serializer::{Direction, Kind, Serialize, SerializeExt, Serializer};
pub use tracking::{Snapshot, TrackChanges};
pub use types::{FixedBytes, FixedString};
pub use validating::{Tag, TypeValidating};
pub use writer::Writer;
