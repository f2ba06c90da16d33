//! Fixed-width little-endian integer reads/writes (§4.1 "Integer writes").
//!
//! Signed values are written as their two's-complement bit pattern, which
//! is exactly what Rust's own `to_le_bytes`/`from_le_bytes` produce, so
//! this module is a thin, uniformly-named wrapper rather than bespoke
//! bit-twiddling.

use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::error::Result;

macro_rules! fixed_width {
    ($write:ident, $read:ident, $t:ty) => {
        #[doc = concat!("Writes a little-endian `", stringify!($t), "`.")]
        pub fn $write(buf: &mut Buffer, value: $t) {
            buf.write(&value.to_le_bytes());
        }

        #[doc = concat!("Reads a little-endian `", stringify!($t), "`.")]
        pub fn $read(cursor: &mut Cursor<'_>) -> Result<$t> {
            let bytes = cursor.take(core::mem::size_of::<$t>())?;
            Ok(<$t>::from_le_bytes(bytes.try_into().expect("exact width")))
        }
    };
}

fixed_width!(write_u8, read_u8, u8);
fixed_width!(write_u16, read_u16, u16);
fixed_width!(write_u32, read_u32, u32);
fixed_width!(write_u64, read_u64, u64);
fixed_width!(write_i8, read_i8, i8);
fixed_width!(write_i16, read_i16, i16);
fixed_width!(write_i32, read_i32, i32);
fixed_width!(write_i64, read_i64, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_is_little_endian() {
        let mut buf = Buffer::new();
        write_u16(&mut buf, 0x0102);
        assert_eq!(buf.finish(), vec![0x02, 0x01]);
    }

    #[test]
    fn signed_round_trip() {
        let mut buf = Buffer::new();
        write_i32(&mut buf, -1);
        let bytes = buf.finish();
        assert_eq!(bytes, vec![0xFF, 0xFF, 0xFF, 0xFF]);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(read_i32(&mut cursor).unwrap(), -1);
    }
}
