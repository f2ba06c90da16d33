//! Stream-level error surface (spec §7).
//!
//! Wraps [`ch_format::Error`] (which itself wraps [`ch_types::Error`]) and
//! adds the two failure modes that only exist once bytes arrive in
//! asynchronous chunks rather than as one contiguous slice: a row frame
//! truncated mid-structure, and a malformed `RowBinaryWithNamesAndTypes`
//! preamble.

use thiserror::Error;

/// Result alias used throughout the streaming reader/encoder.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failure surface of the streaming reader and encoder.
#[derive(Error, Debug)]
pub enum Error {
    /// A codec or primitive-I/O failure. [`ch_format::Error::is_underflow`]
    /// distinguishes the retryable case from every other, fatal one.
    #[error(transparent)]
    Codec(#[from] ch_format::Error),
    /// The byte source was exhausted while a row, header field, or other
    /// structural unit was incomplete (spec §4.8: "End-of-stream mid-row
    /// is UnexpectedEOF").
    #[error("unexpected end of stream while decoding {context} at offset {offset}")]
    UnexpectedEof {
        /// What was being decoded when the source ran dry.
        context: &'static str,
        /// Cursor offset at the point of failure.
        offset: usize,
    },
    /// The `RowBinaryWithNamesAndTypes` preamble (column count, names, or
    /// types) did not parse.
    #[error("malformed header: {reason}")]
    Header {
        /// Human-readable description of what went wrong.
        reason: String,
    },
}

impl Error {
    /// True if this is a retryable underflow from the codec layer rather
    /// than a fatal stream-level error. [`Error::UnexpectedEof`] is
    /// deliberately excluded — by the time the reader raises it, a pull
    /// has already confirmed the source has nothing more to give, so a
    /// retry could never succeed.
    pub fn is_underflow(&self) -> bool {
        matches!(self, Error::Codec(inner) if inner.is_underflow())
    }
}
