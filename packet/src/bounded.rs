//! Range compaction for bounded integers.
//!
//! A bounded integer is transmitted as its offset from the declared minimum, packed into the
//! smallest of 1, 2, 4, or 8 big-endian bytes that can hold `max - min`. The width is a pure
//! function of the declared bounds, never of the value, so both peers always agree on it.
//!
//! ```
//! use commonware_packet::{Bounds, Width};
//!
//! // A six-variant enum costs a single byte.
//! assert_eq!(Bounds::new(0u32..=5).width(), Width::U8);
//!
//! // Signed ranges are measured by their span, not their endpoints.
//! assert_eq!(Bounds::new(-1000i64..=1000).width(), Width::U16);
//! ```

use crate::{validating::Tag, Error};
use bytes::{Buf, BufMut};
use std::ops::RangeInclusive;

/// Storage width selected for a declared range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Width {
    U8,
    U16,
    U32,
    U64,
}

impl Width {
    /// Selects the smallest width whose maximum is at least `range`.
    pub const fn for_range(range: u64) -> Self {
        if range <= u8::MAX as u64 {
            Width::U8
        } else if range <= u16::MAX as u64 {
            Width::U16
        } else if range <= u32::MAX as u64 {
            Width::U32
        } else {
            Width::U64
        }
    }

    /// Number of bytes occupied on the wire.
    pub const fn len(self) -> usize {
        match self {
            Width::U8 => 1,
            Width::U16 => 2,
            Width::U32 => 4,
            Width::U64 => 8,
        }
    }

    /// Packs `offset` big-endian into the first `len()` bytes of the returned array.
    ///
    /// The caller must have checked that `offset` fits.
    pub fn pack(self, offset: u64) -> [u8; 8] {
        let mut scratch = [0u8; 8];
        let mut buf = &mut scratch[..];
        buf.put_uint(offset, self.len());
        scratch
    }

    /// Unpacks a big-endian offset from exactly `len()` bytes.
    pub fn unpack(self, mut bytes: &[u8]) -> u64 {
        bytes.get_uint(self.len())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Integral types that can be range-compacted.
///
/// Values are mapped to a `u64` bit pattern (sign-extended for signed types) so that
/// `max - min` and `value - min` are well-defined wrapping differences whenever
/// `min <= value <= max`.
pub trait Integer: Copy + PartialOrd + std::fmt::Debug + sealed::Sealed {
    /// Smallest representable value.
    const MIN: Self;

    /// Largest representable value.
    const MAX: Self;

    /// Type tag checked by [crate::TypeValidating].
    ///
    /// Platform-width integers share the tag of their 64-bit counterpart so tags agree
    /// between hosts of different word sizes.
    const TAG: Tag;

    /// Fixed-width type a full-range value travels as.
    ///
    /// The type itself, except for platform-width integers, which always travel as their
    /// 64-bit counterpart so that [crate::Serializer::integer] writes the same bytes on
    /// every host.
    type Wire: Integer;

    /// Returns the value's bit pattern widened to 64 bits.
    fn to_bits(self) -> u64;

    /// Narrows a 64-bit pattern back to the type.
    fn from_bits(bits: u64) -> Self;

    /// Converts the value to its wire type. Never loses information.
    fn widen(self) -> Self::Wire;

    /// Converts a wire value back, if the type can hold it on this host.
    fn narrow(wire: Self::Wire) -> Option<Self>;
}

macro_rules! impl_integer {
    ($type:ty, $wide:ty, $wire:ty, $tag:ident) => {
        impl sealed::Sealed for $type {}

        impl Integer for $type {
            const MIN: Self = <$type>::MIN;
            const MAX: Self = <$type>::MAX;
            const TAG: Tag = Tag::$tag;

            type Wire = $wire;

            #[inline]
            fn to_bits(self) -> u64 {
                self as $wide as u64
            }

            #[inline]
            fn from_bits(bits: u64) -> Self {
                bits as $type
            }

            #[inline]
            fn widen(self) -> $wire {
                self as $wire
            }

            #[inline]
            fn narrow(wire: $wire) -> Option<Self> {
                <$type>::try_from(wire).ok()
            }
        }
    };
}

impl_integer!(u8, u64, u8, U8);
impl_integer!(u16, u64, u16, U16);
impl_integer!(u32, u64, u32, U32);
impl_integer!(u64, u64, u64, U64);
impl_integer!(usize, u64, u64, U64);
impl_integer!(i8, i64, i8, I8);
impl_integer!(i16, i64, i16, I16);
impl_integer!(i32, i64, i32, I32);
impl_integer!(i64, i64, i64, I64);
impl_integer!(isize, i64, i64, I64);

/// Declared inclusive bounds of an integral field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds<T: Integer> {
    min: T,
    max: T,
}

impl<T: Integer> Bounds<T> {
    /// Creates bounds covering `range`.
    pub fn new(range: RangeInclusive<T>) -> Self {
        let (min, max) = range.into_inner();
        Self { min, max }
    }

    /// Creates bounds covering every value of `T`.
    pub fn full() -> Self {
        Self {
            min: T::MIN,
            max: T::MAX,
        }
    }

    /// Lower bound.
    pub fn min(&self) -> T {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> T {
        self.max
    }

    /// Returns true if `min <= max`.
    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }

    /// Returns true if the value is within the bounds.
    pub fn contains(&self, value: &T) -> bool {
        self.min <= *value && *value <= self.max
    }

    /// Span of the bounds (`max - min`).
    pub fn range(&self) -> u64 {
        self.max.to_bits().wrapping_sub(self.min.to_bits())
    }

    /// Wire width for any value within the bounds.
    pub fn width(&self) -> Width {
        Width::for_range(self.range())
    }

    /// Maps an in-bounds value to its offset from `min`.
    ///
    /// Fails with [Error::InvalidBounds] if `min > max`, or [Error::OutOfRange] if the
    /// value is outside the bounds.
    pub fn offset(&self, value: T, name: &'static str) -> Result<u64, Error> {
        if !self.is_valid() {
            return Err(Error::InvalidBounds(name));
        }
        if !self.contains(&value) {
            return Err(Error::OutOfRange(name));
        }
        Ok(value.to_bits().wrapping_sub(self.min.to_bits()))
    }

    /// Maps an offset received from the wire back to a value.
    ///
    /// Fails with [Error::OutOfRange] if the offset exceeds the span.
    pub fn value(&self, offset: u64, name: &'static str) -> Result<T, Error> {
        if !self.is_valid() {
            return Err(Error::InvalidBounds(name));
        }
        if offset > self.range() {
            return Err(Error::OutOfRange(name));
        }
        Ok(T::from_bits(self.min.to_bits().wrapping_add(offset)))
    }
}

impl<T: Integer> From<RangeInclusive<T>> for Bounds<T> {
    fn from(range: RangeInclusive<T>) -> Self {
        Self::new(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paste::paste;

    #[test]
    fn test_width_boundaries() {
        assert_eq!(Width::for_range(0), Width::U8);
        assert_eq!(Width::for_range(255), Width::U8);
        assert_eq!(Width::for_range(256), Width::U16);
        assert_eq!(Width::for_range(65_535), Width::U16);
        assert_eq!(Width::for_range(65_536), Width::U32);
        assert_eq!(Width::for_range(u32::MAX as u64), Width::U32);
        assert_eq!(Width::for_range(u32::MAX as u64 + 1), Width::U64);
        assert_eq!(Width::for_range(u64::MAX), Width::U64);
    }

    #[test]
    fn test_pack_unpack() {
        let packed = Width::U16.pack(0x0102);
        assert_eq!(&packed[..2], &[0x01, 0x02]);
        assert_eq!(Width::U16.unpack(&packed[..2]), 0x0102);

        let packed = Width::U64.pack(u64::MAX);
        assert_eq!(packed, [0xFF; 8]);
        assert_eq!(Width::U64.unpack(&packed), u64::MAX);
    }

    #[test]
    fn test_signed_span() {
        let bounds = Bounds::new(-128i8..=127);
        assert_eq!(bounds.range(), 255);
        assert_eq!(bounds.width(), Width::U8);
        assert_eq!(bounds.offset(-128, "x").unwrap(), 0);
        assert_eq!(bounds.offset(127, "x").unwrap(), 255);
        assert_eq!(bounds.value(0, "x").unwrap(), -128);
        assert_eq!(bounds.value(255, "x").unwrap(), 127);

        let bounds = Bounds::<i64>::full();
        assert_eq!(bounds.range(), u64::MAX);
        assert_eq!(bounds.offset(i64::MIN, "x").unwrap(), 0);
        assert_eq!(bounds.value(u64::MAX, "x").unwrap(), i64::MAX);
    }

    #[test]
    fn test_offset_rejects() {
        let bounds = Bounds::new(10u32..=20);
        assert_eq!(bounds.offset(9, "f"), Err(Error::OutOfRange("f")));
        assert_eq!(bounds.offset(21, "f"), Err(Error::OutOfRange("f")));
        assert_eq!(bounds.value(11, "f"), Err(Error::OutOfRange("f")));

        let inverted = Bounds { min: 5u8, max: 4 };
        assert_eq!(inverted.offset(5, "g"), Err(Error::InvalidBounds("g")));
        assert_eq!(inverted.value(0, "g"), Err(Error::InvalidBounds("g")));
    }

    macro_rules! impl_bounds_test {
        ($type:ty) => {
            paste! {
                #[test]
                fn [<test_bounds_ $type>]() {
                    let bounds = Bounds::<$type>::full();
                    assert_eq!(bounds.width().len(), std::mem::size_of::<$type>());
                    for value in [<$type>::MIN, 0 as $type, 1 as $type, <$type>::MAX] {
                        let offset = bounds.offset(value, "v").unwrap();
                        assert_eq!(bounds.value(offset, "v").unwrap(), value);
                    }
                }
            }
        };
    }
    impl_bounds_test!(u8);
    impl_bounds_test!(u16);
    impl_bounds_test!(u32);
    impl_bounds_test!(u64);
    impl_bounds_test!(i8);
    impl_bounds_test!(i16);
    impl_bounds_test!(i32);
    impl_bounds_test!(i64);

    #[test]
    fn test_platform_width_travels_as_64_bits() {
        assert_eq!(std::mem::size_of::<<usize as Integer>::Wire>(), 8);
        assert_eq!(std::mem::size_of::<<isize as Integer>::Wire>(), 8);
        assert_eq!(usize::narrow(usize::MAX.widen()), Some(usize::MAX));
        assert_eq!(isize::narrow(isize::MIN.widen()), Some(isize::MIN));
        assert_eq!(u16::narrow(u16::MAX.widen()), Some(u16::MAX));
    }
}
