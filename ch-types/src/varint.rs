//! LEB128 varint encoding (§4.1, §6).
//!
//! Seven payload bits per byte, little-endian, high bit set on every byte
//! but the last.

use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::error::{Error, Result};

/// A varint may use at most this many bytes to encode a `u64`: `ceil(64/7)`.
pub const MAX_VARINT_BYTES: usize = 10;

/// Writes `value` as a LEB128 varint.
pub fn write_varint(buf: &mut Buffer, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Reads a LEB128 varint, advancing the cursor past it.
///
/// Returns [`Error::Underflow`] if the buffer ends before a terminating
/// byte is seen, and [`Error::VarintTooLong`] if more than
/// [`MAX_VARINT_BYTES`] bytes are consumed without terminating (a
/// corrupt-stream guard; LEB128 itself has no length limit).
pub fn read_varint(cursor: &mut Cursor<'_>) -> Result<u64> {
    let start = cursor.offset();
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    for i in 0..MAX_VARINT_BYTES {
        let byte = match cursor.take_byte() {
            Ok(b) => b,
            Err(e) => {
                cursor.restore(start);
                return Err(e);
            }
        };
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        let _ = i;
    }
    cursor.restore(start);
    Err(Error::VarintTooLong {
        max_bytes: MAX_VARINT_BYTES,
    })
}

/// Size in bytes the varint encoding of `value` would occupy.
///
/// Matches §8 invariant 3: `ceil(bit_length(n | 1) / 7)`.
pub fn varint_size(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(n: u64) -> u64 {
        let mut buf = Buffer::new();
        write_varint(&mut buf, n);
        let bytes = buf.finish();
        assert_eq!(bytes.len(), varint_size(n));
        let mut cursor = Cursor::new(&bytes);
        read_varint(&mut cursor).unwrap()
    }

    #[test]
    fn boundary_byte_widths() {
        let cases: [(u64, usize); 5] =
            [(0, 1), (127, 1), (128, 2), (16383, 2), (16384, 3)];
        for (n, expected_len) in cases {
            let mut buf = Buffer::new();
            write_varint(&mut buf, n);
            assert_eq!(buf.finish().len(), expected_len, "n = {n}");
        }
    }

    #[test]
    fn roundtrips_small_and_large() {
        for n in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
            assert_eq!(roundtrip(n), n);
        }
    }

    #[test]
    fn underflow_mid_varint_restores_offset() {
        // A two-byte varint (128) truncated to its first byte.
        let mut buf = Buffer::new();
        write_varint(&mut buf, 128);
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes[..1]);
        let before = cursor.offset();
        let err = read_varint(&mut cursor).unwrap_err();
        assert!(err.is_underflow());
        assert_eq!(cursor.offset(), before);
    }

    #[quickcheck_macros::quickcheck]
    fn prop_roundtrip(n: u64) -> bool {
        roundtrip(n) == n
    }
}
