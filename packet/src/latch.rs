//! Sticky validity shared by every serializer.

use crate::Error;
use tracing::debug;

/// Records the first failure of a serializer.
///
/// Once an error is latched it is never cleared. Subsequent operations observe
/// [Error::Invalidated] through [Latch::check].
#[derive(Clone, Debug, Default)]
pub struct Latch {
    error: Option<Error>,
}

impl Latch {
    /// Creates a latch in the valid state.
    pub const fn new() -> Self {
        Self { error: None }
    }

    /// Returns true if no error has been latched.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the originating error, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Fails with [Error::Invalidated] if an error has already been latched.
    #[inline]
    pub fn check(&self) -> Result<(), Error> {
        match self.error {
            Some(_) => Err(Error::Invalidated),
            None => Ok(()),
        }
    }

    /// Latches `error` unless an earlier error is already held.
    pub fn fail(&mut self, field: &'static str, error: Error) {
        if self.error.is_some() || error == Error::Invalidated {
            return;
        }
        debug!(field, ?error, "serializer invalidated");
        self.error = Some(error);
    }

    /// Passes `result` through, latching it if it is an error.
    #[inline]
    pub fn record<T>(
        &mut self,
        field: &'static str,
        result: Result<T, Error>,
    ) -> Result<T, Error> {
        if let Err(error) = &result {
            self.fail(field, error.clone());
        }
        result
    }

    /// Returns the originating error, or `value` if none was latched.
    pub fn finish<T>(&self, value: T) -> Result<T, Error> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(value),
        }
    }
}
