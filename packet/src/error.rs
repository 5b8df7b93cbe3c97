//! Error types for serializer operations

use thiserror::Error;

/// Error type for serializer operations
///
/// Every variant except [Error::Invalidated] originates a failure. Once a serializer has
/// latched an originating error, all later operations report [Error::Invalidated].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unexpected end of buffer: needed {needed}, remaining {remaining}")]
    EndOfBuffer { needed: usize, remaining: usize },
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),
    #[error("invalid bounds (min > max): {0}")]
    InvalidBounds(&'static str),
    #[error("length exceeded: {0} > {1}")]
    LengthExceeded(usize, usize), // found, max
    #[error("type mismatch in {field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: &'static str,
        expected: u8,
        found: u8,
    },
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(&'static str),
    #[error("extra data found: {0} bytes")]
    ExtraData(usize),
    #[error("serializer already invalid")]
    Invalidated,
}
