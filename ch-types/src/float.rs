//! NaN-preserving float wrappers (§3 "NaN wrapper", §4.4, §9).
//!
//! Standard float setters canonicalize every NaN bit pattern to one quiet
//! NaN on store, which silently destroys signaling-NaN payloads on a
//! round trip. [`Float32Value`]/[`Float64Value`] carry the original bytes
//! alongside the numeric value so `decode(encode(x))` is byte-exact even
//! for NaNs (§8 invariant 1).

use crate::buffer::Buffer;
use crate::cursor::Cursor;
use crate::error::Result;

macro_rules! float_value {
    ($name:ident, $float:ty, $bytes:literal, $bits:ty) => {
        #[doc = concat!("A `", stringify!($float), "` that preserves its exact bit pattern through a round trip.")]
        #[derive(Debug, Clone, Copy)]
        pub enum $name {
            // `PartialEq` is hand-written below as bitwise equality (see
            // `bits_eq`) rather than derived: derived equality would compare
            // `Plain`'s `$float` with `==`, under which NaN never equals
            // itself, contradicting §8 invariant 1's bit-exact comparison.
            /// A non-NaN value, or a NaN whose exact bits were not tracked
            /// (e.g. constructed from a plain numeric literal).
            Plain($float),
            /// A NaN whose original bytes must survive encode unchanged.
            Nan([u8; $bytes]),
        }

        impl $name {
            /// Wraps a plain numeric value.
            pub fn from_value(value: $float) -> Self {
                if value.is_nan() {
                    Self::Nan(value.to_le_bytes())
                } else {
                    Self::Plain(value)
                }
            }

            /// Wraps raw bytes read off the wire, detecting NaN.
            pub fn from_le_bytes(bytes: [u8; $bytes]) -> Self {
                let value = <$float>::from_le_bytes(bytes);
                if value.is_nan() {
                    Self::Nan(bytes)
                } else {
                    Self::Plain(value)
                }
            }

            /// The numeric value (a NaN's specific payload is lost here;
            /// use [`Self::to_le_bytes`] to preserve it).
            pub fn value(&self) -> $float {
                match self {
                    Self::Plain(v) => *v,
                    Self::Nan(bytes) => <$float>::from_le_bytes(*bytes),
                }
            }

            /// True if this wraps a NaN.
            pub fn is_nan(&self) -> bool {
                matches!(self, Self::Nan(_))
            }

            /// The exact bytes this value would write to the wire.
            pub fn to_le_bytes(&self) -> [u8; $bytes] {
                match self {
                    Self::Plain(v) => v.to_le_bytes(),
                    Self::Nan(bytes) => *bytes,
                }
            }

            /// Bitwise equality — the comparison §8 invariant 1 requires
            /// for float round trips (numeric `==` on NaN is never true).
            pub fn bits_eq(&self, other: &Self) -> bool {
                self.to_le_bytes() == other.to_le_bytes()
            }
        }

        impl From<$float> for $name {
            fn from(value: $float) -> Self {
                Self::from_value(value)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.bits_eq(other)
            }
        }

        /// Writes the value's exact bytes (bypassing the standard float
        /// setter for NaN payloads, per §4.1 and §4.4).
        pub fn encode(buf: &mut Buffer, value: &$name) {
            buf.write(&value.to_le_bytes());
        }

        /// Reads a value, returning a NaN-tagged wrapper when appropriate.
        pub fn decode(cursor: &mut Cursor<'_>) -> Result<$name> {
            let bytes: [u8; $bytes] = cursor.take($bytes)?.try_into().expect("exact width");
            Ok(<$name>::from_le_bytes(bytes))
        }
    };
}

pub mod f32 {
    use super::*;
    float_value!(Float32Value, f32, 4, u32);
}

pub mod f64 {
    use super::*;
    float_value!(Float64Value, f64, 8, u64);
}

pub use f32::Float32Value;
pub use f64::Float64Value;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signaling_nan_round_trips_exact_bits() {
        let bytes = [0x39, 0x08, 0x8C, 0xFF]; // LE for 0xFF8C0839
        let value = Float32Value::from_le_bytes(bytes);
        assert!(value.is_nan());
        let mut buf = Buffer::new();
        f32::encode(&mut buf, &value);
        assert_eq!(buf.finish(), bytes);
    }

    #[test]
    fn plain_value_round_trips() {
        let value = Float64Value::from_value(-123.5);
        let mut buf = Buffer::new();
        f64::encode(&mut buf, &value);
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        let decoded = f64::decode(&mut cursor).unwrap();
        assert!(value.bits_eq(&decoded));
    }
}
