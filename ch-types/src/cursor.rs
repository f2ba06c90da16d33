use crate::error::{Error, Result};

/// Decode-time choices threaded through every codec call.
///
/// `map_as_array` is the one flag spec'd by the wire format itself (Map
/// decodes to an ordered pair sequence, preserving duplicate keys, instead
/// of collapsing into a mapping). The other two are ambient additions: they
/// let a caller skip work it doesn't need without changing the wire
/// contract of any type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Map decodes to an ordered sequence of `(key, value)` pairs rather
    /// than a deduplicated mapping. Default `false`.
    pub map_as_array: bool,
    /// Whether the `JSON` type is dispatchable at all. Default `true`;
    /// turning it off turns a `JSON` column reference into `UnsupportedType`
    /// instead of silently paying for path-map allocation.
    pub enable_json: bool,
    /// Whether `String`/`FixedString` decode validates UTF-8. Default
    /// `true`; callers that will re-validate downstream can disable this.
    pub validate_utf8: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            map_as_array: false,
            enable_json: true,
            validate_utf8: true,
        }
    }
}

/// A read position into a borrowed byte slice, paired with decode options.
///
/// `offset` is advanced monotonically by a successful decode. On
/// [`Error::Underflow`] the caller must restore the offset to where it was
/// before the failed operation began — the cursor itself does not roll
/// back automatically, matching the "caller must restore" invariant in the
/// data model.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    options: DecodeOptions,
}

impl<'a> Cursor<'a> {
    /// Wraps `bytes` for reading from offset zero with default options.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            options: DecodeOptions::default(),
        }
    }

    /// Wraps `bytes` for reading with explicit decode options.
    pub fn with_options(bytes: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            bytes,
            offset: 0,
            options,
        }
    }

    /// Current read offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the backing slice.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Decode options in effect for this cursor.
    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    /// Bytes remaining from the current offset to the end of the slice.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Resets the offset to a previously observed value. Used by the
    /// streaming reader's retry-on-underflow loop to undo a partial decode.
    pub fn restore(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Returns `need` unread bytes without advancing the cursor, or
    /// [`Error::Underflow`] if fewer than `need` bytes remain.
    pub fn peek(&self, need: usize) -> Result<&'a [u8]> {
        let end = self.offset + need;
        if end > self.bytes.len() {
            return Err(Error::Underflow {
                needed: need,
                available: self.bytes.len() - self.offset,
            });
        }
        Ok(&self.bytes[self.offset..end])
    }

    /// Reads and consumes exactly `need` bytes.
    pub fn take(&mut self, need: usize) -> Result<&'a [u8]> {
        let slice = self.peek(need)?;
        self.offset += need;
        Ok(slice)
    }

    /// Reads and consumes a single byte.
    pub fn take_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// The full unread slice `[offset, len)`. Mirrors the streaming
    /// reader's `getSlice()` operation (§4.8) for synchronous callers that
    /// already hold a contiguous buffer.
    pub fn unread(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    /// Advances the offset by `n` without reading, for callers that
    /// inspected bytes via [`Cursor::peek`] or [`Cursor::unread`] directly
    /// (the typed-array array fast path does this).
    pub fn advance(&mut self, n: usize) {
        self.offset += n;
    }
}
