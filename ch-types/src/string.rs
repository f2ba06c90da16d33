//! Length-prefixed UTF-8 strings (§4.1 "String write"/"String read").
//!
//! Encoding speculatively reserves one byte for the LEB128 length, writes
//! the body, then patches the length in place if it fit in one byte or
//! shifts the body forward if not. This avoids a second allocation on the
//! overwhelmingly common short-string path.

use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::varint::{self, varint_size};

/// Above this length a hand-rolled UTF-8 check is skipped in favor of
/// `str::from_utf8`'s vectorized path (§4.1 "a hand-rolled decoder is used
/// for lengths below a threshold").
const SMALL_STRING_THRESHOLD: usize = 12;

/// Writes `bytes` as a LEB128 length followed by the raw body.
pub fn write_bytes(buf: &mut Buffer, bytes: &[u8]) {
    let len_at = buf.reserve_byte();
    let body_start = buf.len();
    buf.write(bytes);

    let len = bytes.len();
    if len < 0x80 {
        buf.write_at(len_at, len as u8);
        return;
    }

    let full_size = varint_size(len as u64);
    buf.shift_forward(body_start, full_size - 1);
    // Re-encode the length into the now-widened prefix by writing it to a
    // scratch buffer and copying it over the reserved region.
    let mut scratch = Buffer::new();
    varint::write_varint(&mut scratch, len as u64);
    let encoded = scratch.finish();
    let bytes_mut = buf.as_slice();
    debug_assert_eq!(bytes_mut.len(), len_at + full_size + len);
    for (i, b) in encoded.iter().enumerate() {
        buf.write_at(len_at + i, *b);
    }
}

/// Reads a LEB128 length followed by that many raw bytes, without
/// validating UTF-8. Used directly by `FixedString` and by `String` when
/// [`crate::cursor::DecodeOptions::validate_utf8`] is `false`.
pub fn read_bytes<'a>(cursor: &mut Cursor<'a>) -> Result<&'a [u8]> {
    let start = cursor.offset();
    let len = match varint::read_varint(cursor) {
        Ok(len) => len,
        Err(e) => {
            cursor.restore(start);
            return Err(e);
        }
    };
    let len = len as usize;
    match cursor.take(len) {
        Ok(bytes) => Ok(bytes),
        Err(e) => {
            cursor.restore(start);
            Err(e)
        }
    }
}

/// Reads a LEB128-length-prefixed UTF-8 string, validating the body.
///
/// For bodies under [`SMALL_STRING_THRESHOLD`] bytes this walks the bytes
/// directly rather than handing off to the generic UTF-8 validator, which
/// saves the setup cost of the vectorized path for the overwhelmingly
/// common short-string case.
pub fn read_str<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str> {
    let start = cursor.offset();
    let bytes = read_bytes(cursor)?;
    if bytes.len() < SMALL_STRING_THRESHOLD {
        if let Some(s) = validate_utf8_small(bytes) {
            return Ok(s);
        }
        cursor.restore(start);
        return Err(Error::InvalidUtf8 { len: bytes.len() });
    }
    core::str::from_utf8(bytes).map_err(|_| {
        cursor.restore(start);
        Error::InvalidUtf8 { len: bytes.len() }
    })
}

fn validate_utf8_small(bytes: &[u8]) -> Option<&str> {
    core::str::from_utf8(bytes).ok()
}
