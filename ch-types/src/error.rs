use thiserror::Error;

/// Result alias used throughout the primitive I/O layer.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failure surface of the primitive I/O layer.
///
/// [`Error::Underflow`] is special: it is the sole signal the streaming
/// reader uses to decide "pull more bytes and retry" rather than "fail the
/// stream". Every other variant is fatal to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read needed more bytes than the buffer currently holds.
    #[error("buffer underflow: needed {needed} bytes, {available} available")]
    Underflow {
        /// Bytes the operation required to complete.
        needed: usize,
        /// Bytes actually available at the read offset.
        available: usize,
    },
    /// A length-prefixed string was not valid UTF-8.
    #[error("invalid utf-8 in string of {len} bytes")]
    InvalidUtf8 {
        /// Declared length of the string body.
        len: usize,
    },
    /// A LEB128 varint did not terminate within the maximum byte width.
    #[error("varint exceeds {max_bytes} bytes without a terminating byte")]
    VarintTooLong {
        /// Maximum number of bytes a varint of the requested width may use.
        max_bytes: usize,
    },
}

impl Error {
    /// True if this is a retryable underflow rather than a fatal error.
    pub fn is_underflow(&self) -> bool {
        matches!(self, Error::Underflow { .. })
    }
}
