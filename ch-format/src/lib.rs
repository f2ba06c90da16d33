//! Type grammar, codec registry and dispatch, and the codec families for
//! ClickHouse's RowBinary and Native wire formats.
//!
//! Built on [`ch_types`]'s primitive I/O. This crate owns everything that
//! knows what a textual type descriptor *means*: parsing it
//! ([`grammar`]), turning it into a cached, shareable codec instance
//! ([`registry`]), and the codec families themselves ([`codec`]) that
//! read and write every scalar, composite, precision, and dynamic type
//! ClickHouse supports. `ch_wire`, the root crate, drives these codecs
//! over a streaming byte source; nothing here is aware of streaming,
//! chunk boundaries, or TCP.

pub mod codec;
pub mod error;
pub mod grammar;
pub mod registry;
pub mod value;

pub use codec::{Codec, ScalarKind};
pub use error::{Error, Result};
pub use registry::CodecRegistry;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use ch_types::Buffer;

    /// Spec §8 Scenario A, restricted to the per-column codec (the header
    /// framing itself is `ch_wire`'s concern).
    #[test]
    fn row_binary_with_names_and_types_single_row() {
        let registry = CodecRegistry::new();
        let id_codec = registry.get("UInt64").unwrap();
        let name_codec = registry.get("String").unwrap();

        let mut buf = Buffer::new();
        id_codec.encode(&mut buf, &Value::UInt64(1)).unwrap();
        name_codec
            .encode(&mut buf, &Value::String("Alice".to_string()))
            .unwrap();
        assert_eq!(
            buf.finish(),
            vec![
                0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x41, 0x6C, 0x69, 0x63, 0x65
            ]
        );
    }

    #[test]
    fn signaling_nan_round_trips_through_registry_codec() {
        use ch_types::{Cursor, Float32Value};

        let registry = CodecRegistry::new();
        let codec = registry.get("Float32").unwrap();
        let nan = Float32Value::from_le_bytes([0x39, 0x08, 0x8C, 0xFF]);
        let mut buf = Buffer::new();
        codec.encode(&mut buf, &Value::Float32(nan)).unwrap();
        let bytes = buf.finish();
        assert_eq!(bytes, vec![0x39, 0x08, 0x8C, 0xFF]);

        let mut cursor = Cursor::new(&bytes);
        match codec.decode(&mut cursor).unwrap() {
            Value::Float32(decoded) => assert!(decoded.bits_eq(&nan)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
