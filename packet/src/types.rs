//! [Serialize] implementations for common containers.
//!
//! Containers that hold variable-length data have a compile-time capacity, so a decoded
//! packet can never grow an object beyond what it was declared to hold.

use crate::{Direction, Error, Kind, Serialize, Serializer};

impl<T: Serialize + Default> Serialize for Option<T> {
    fn serialize<S: Serializer>(&mut self, serializer: &mut S) -> Result<(), Error> {
        let mut present = self.is_some();
        serializer.bool(&mut present, "present")?;
        if present {
            // Scoped so that change tracking can tell the contents from the fields after it.
            return serializer.object(self.get_or_insert_with(T::default), "some");
        }
        if serializer.direction() == Direction::Decode {
            *self = None;
        }
        Ok(())
    }
}

impl<T: Serialize, const N: usize> Serialize for [T; N] {
    fn serialize<S: Serializer>(&mut self, serializer: &mut S) -> Result<(), Error> {
        for item in self.iter_mut() {
            item.serialize(serializer)?;
        }
        Ok(())
    }
}

/// Up to `N` opaque bytes.
#[derive(Clone, Copy, Debug)]
pub struct FixedBytes<const N: usize> {
    data: [u8; N],
    len: usize,
}

impl<const N: usize> FixedBytes<N> {
    /// Copies `bytes`, failing if it is longer than `N`.
    pub fn new(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() > N {
            return Err(Error::LengthExceeded(bytes.len(), N));
        }
        let mut data = [0u8; N];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            data,
            len: bytes.len(),
        })
    }

    /// Returns the held bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Returns the number of held bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bytes are held.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> PartialEq for FixedBytes<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<const N: usize> Eq for FixedBytes<N> {}

impl<const N: usize> std::hash::Hash for FixedBytes<N> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<const N: usize> Default for FixedBytes<N> {
    fn default() -> Self {
        Self {
            data: [0u8; N],
            len: 0,
        }
    }
}

impl<const N: usize> Serialize for FixedBytes<N> {
    fn serialize<S: Serializer>(&mut self, serializer: &mut S) -> Result<(), Error> {
        serializer.bytes(&mut self.data, &mut self.len, Kind::Opaque, "bytes")
    }
}

/// A UTF-8 string of up to `N` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct FixedString<const N: usize> {
    bytes: FixedBytes<N>,
}

impl<const N: usize> FixedString<N> {
    /// Copies `text`, failing if it is longer than `N` bytes.
    pub fn new(text: &str) -> Result<Self, Error> {
        Ok(Self {
            bytes: FixedBytes::new(text.as_bytes())?,
        })
    }

    /// Returns the held text.
    pub fn as_str(&self) -> &str {
        // Contents are validated on construction and decode.
        std::str::from_utf8(self.bytes.as_slice()).unwrap_or_default()
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the string is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl<const N: usize> Serialize for FixedString<N> {
    fn serialize<S: Serializer>(&mut self, serializer: &mut S) -> Result<(), Error> {
        // Received bytes are only kept once they are known to be valid text.
        let mut received = self.bytes;
        serializer.bytes(&mut received.data, &mut received.len, Kind::Utf8, "string")?;
        if std::str::from_utf8(received.as_slice()).is_err() {
            let error = Error::InvalidUtf8("string");
            serializer.invalidate("string", error.clone());
            return Err(error);
        }
        self.bytes = received;
        Ok(())
    }
}

impl<const N: usize> TryFrom<&str> for FixedString<N> {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self, Error> {
        Self::new(text)
    }
}
