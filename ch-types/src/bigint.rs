//! Extended-precision integer reads/writes (§4.1, §4.4, §9
//! "Signed extended-precision (128/256 bit)").
//!
//! The wire layout is two (128-bit) or four (256-bit) 64-bit little-endian
//! limbs, low limb first, the top limb signed for `IntN` and unsigned for
//! `UIntN`. Rust's native `u128`/`i128` little-endian byte representation
//! is bit-for-bit identical to that limb layout, so no manual limb-splitting
//! is needed there; [`ethnum::U256`]/[`ethnum::I256`] provide the same
//! guarantee for the 256-bit types (already a teacher-workspace dependency,
//! `fuel-vm/Cargo.toml`'s `ethnum = "1.3"`).

use ethnum::{I256, U256};

use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::error::Result;

/// Writes a little-endian `u128` (two unsigned 64-bit limbs, low first).
pub fn write_u128(buf: &mut Buffer, value: u128) {
    buf.write(&value.to_le_bytes());
}

/// Reads a little-endian `u128`.
pub fn read_u128(cursor: &mut Cursor<'_>) -> Result<u128> {
    let bytes = cursor.take(16)?;
    Ok(u128::from_le_bytes(bytes.try_into().expect("exact width")))
}

/// Writes a little-endian `i128` (two limbs, the high limb signed).
pub fn write_i128(buf: &mut Buffer, value: i128) {
    buf.write(&value.to_le_bytes());
}

/// Reads a little-endian `i128`.
pub fn read_i128(cursor: &mut Cursor<'_>) -> Result<i128> {
    let bytes = cursor.take(16)?;
    Ok(i128::from_le_bytes(bytes.try_into().expect("exact width")))
}

/// Writes a little-endian `U256` (four unsigned 64-bit limbs, low first).
pub fn write_u256(buf: &mut Buffer, value: U256) {
    buf.write(&value.to_le_bytes());
}

/// Reads a little-endian `U256`.
pub fn read_u256(cursor: &mut Cursor<'_>) -> Result<U256> {
    let bytes = cursor.take(32)?;
    Ok(U256::from_le_bytes(bytes.try_into().expect("exact width")))
}

/// Writes a little-endian `I256` (four limbs, the high limb signed).
pub fn write_i256(buf: &mut Buffer, value: I256) {
    buf.write(&value.to_le_bytes());
}

/// Reads a little-endian `I256`.
pub fn read_i256(cursor: &mut Cursor<'_>) -> Result<I256> {
    let bytes = cursor.take(32)?;
    Ok(I256::from_le_bytes(bytes.try_into().expect("exact width")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u256_round_trips_low_limb_first() {
        let value = U256::from_words(1, 2); // high=1, low=2
        let mut buf = Buffer::new();
        write_u256(&mut buf, value);
        let bytes = buf.finish();
        // low limb (2) occupies the first 16 bytes.
        assert_eq!(&bytes[0..16], &2u128.to_le_bytes());
        assert_eq!(&bytes[16..32], &1u128.to_le_bytes());
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(read_u256(&mut cursor).unwrap(), value);
    }

    #[test]
    fn i256_round_trips_negative() {
        let value = I256::from(-1i64);
        let mut buf = Buffer::new();
        write_i256(&mut buf, value);
        let bytes = buf.finish();
        assert_eq!(bytes, vec![0xFF; 32]);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(read_i256(&mut cursor).unwrap(), value);
    }
}
