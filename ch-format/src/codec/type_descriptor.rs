//! Binary type descriptors (spec §4.6).
//!
//! Used inside `Dynamic` and `JSON` payloads, where every value is
//! preceded by a self-describing type: a single-byte type code, followed
//! by a parametric body for container/precision types. Unlike the
//! textual grammar (`crate::grammar`), this is not re-parsed through the
//! registry — a descriptor fully determines its [`Codec`] on its own, so
//! decoding one builds a `Codec` tree directly.

use std::sync::Arc;

use ch_types::{fixed, varint, Buffer, Cursor};
use indexmap::IndexMap;

use super::{Codec, DateTime64Codec, DecimalCodec, DecimalWidth, EnumCodec, EnumWidth, ScalarKind, TupleShape, VariantCodec};
use crate::error::{Error, Result};

mod code {
    pub const NOTHING: u8 = 0x00;
    pub const UINT8: u8 = 0x01;
    pub const UINT16: u8 = 0x02;
    pub const UINT32: u8 = 0x03;
    pub const UINT64: u8 = 0x04;
    pub const UINT128: u8 = 0x05;
    pub const UINT256: u8 = 0x06;
    pub const INT8: u8 = 0x07;
    pub const INT16: u8 = 0x08;
    pub const INT32: u8 = 0x09;
    pub const INT64: u8 = 0x0A;
    pub const INT128: u8 = 0x0B;
    pub const INT256: u8 = 0x0C;
    pub const FLOAT32: u8 = 0x0D;
    pub const FLOAT64: u8 = 0x0E;
    pub const DATE: u8 = 0x0F;
    pub const DATE32: u8 = 0x10;
    pub const DATETIME: u8 = 0x11;
    pub const DATETIME64: u8 = 0x13;
    pub const DATETIME64_TZ: u8 = 0x14;
    pub const STRING: u8 = 0x15;
    pub const FIXED_STRING: u8 = 0x16;
    pub const ENUM8: u8 = 0x17;
    pub const ENUM16: u8 = 0x18;
    pub const DECIMAL32: u8 = 0x19;
    pub const DECIMAL64: u8 = 0x1A;
    pub const DECIMAL128: u8 = 0x1B;
    pub const DECIMAL256: u8 = 0x1C;
    pub const UUID: u8 = 0x1D;
    pub const ARRAY: u8 = 0x1E;
    pub const TUPLE: u8 = 0x1F;
    pub const TUPLE_NAMED: u8 = 0x20;
    pub const NULLABLE: u8 = 0x23;
    pub const MAP: u8 = 0x27;
    pub const IPV4: u8 = 0x28;
    pub const IPV6: u8 = 0x29;
    pub const VARIANT: u8 = 0x2A;
    pub const DYNAMIC: u8 = 0x2B;
    pub const BOOL: u8 = 0x2D;
}

/// Default precision ClickHouse assumes when the textual form omits it
/// (spec §4.6).
pub fn default_precision(width: DecimalWidth) -> u32 {
    match width {
        DecimalWidth::W4 => 9,
        DecimalWidth::W8 => 18,
        DecimalWidth::W16 => 38,
        DecimalWidth::W32 => 76,
    }
}

pub fn encode_type_descriptor(buf: &mut Buffer, codec: &Codec) -> Result<()> {
    match codec {
        Codec::Nothing => buf.push(code::NOTHING),
        Codec::Scalar(kind) => encode_scalar_code(buf, *kind)?,
        Codec::Nullable(inner) => {
            buf.push(code::NULLABLE);
            encode_type_descriptor(buf, inner)?;
        }
        Codec::Array(inner) => {
            buf.push(code::ARRAY);
            encode_type_descriptor(buf, inner)?;
        }
        Codec::Map { key, value } => {
            buf.push(code::MAP);
            encode_type_descriptor(buf, key)?;
            encode_type_descriptor(buf, value)?;
        }
        Codec::Tuple(TupleShape::Positional(elems)) => {
            buf.push(code::TUPLE);
            varint::write_varint(buf, elems.len() as u64);
            for elem in elems {
                encode_type_descriptor(buf, elem)?;
            }
        }
        Codec::Tuple(TupleShape::Named(elems)) => {
            buf.push(code::TUPLE_NAMED);
            varint::write_varint(buf, elems.len() as u64);
            for (name, elem) in elems {
                super::write_plain_string(buf, name);
                encode_type_descriptor(buf, elem)?;
            }
        }
        Codec::FixedString(n) => {
            buf.push(code::FIXED_STRING);
            varint::write_varint(buf, *n as u64);
        }
        Codec::Enum(e) => {
            buf.push(match e.width {
                EnumWidth::Eight => code::ENUM8,
                EnumWidth::Sixteen => code::ENUM16,
            });
            varint::write_varint(buf, e.names.len() as u64);
            for (tag, name) in &e.names {
                super::write_plain_string(buf, name);
                match e.width {
                    EnumWidth::Eight => buf.push(*tag as i8 as u8),
                    EnumWidth::Sixteen => buf.write(&tag.to_le_bytes()),
                }
            }
        }
        Codec::Decimal(d) => {
            buf.push(match d.width {
                DecimalWidth::W4 => code::DECIMAL32,
                DecimalWidth::W8 => code::DECIMAL64,
                DecimalWidth::W16 => code::DECIMAL128,
                DecimalWidth::W32 => code::DECIMAL256,
            });
            buf.push(d.precision as u8);
            buf.push(d.scale as u8);
        }
        Codec::DateTime64(d) => {
            buf.push(code::DATETIME64);
            buf.push(d.precision);
        }
        Codec::Variant(v) => {
            buf.push(code::VARIANT);
            varint::write_varint(buf, v.types.len() as u64);
            for t in &v.types {
                encode_type_descriptor(buf, t)?;
            }
        }
        Codec::Dynamic => buf.push(code::DYNAMIC),
        Codec::Json => {
            return Err(Error::unsupported("JSON (no binary type descriptor form)"));
        }
    }
    Ok(())
}

fn encode_scalar_code(buf: &mut Buffer, kind: ScalarKind) -> Result<()> {
    use ScalarKind::*;
    let c = match kind {
        UInt8 => code::UINT8,
        UInt16 => code::UINT16,
        UInt32 => code::UINT32,
        UInt64 => code::UINT64,
        UInt128 => code::UINT128,
        UInt256 => code::UINT256,
        Int8 => code::INT8,
        Int16 => code::INT16,
        Int32 => code::INT32,
        Int64 => code::INT64,
        Int128 => code::INT128,
        Int256 => code::INT256,
        Float32 => code::FLOAT32,
        Float64 => code::FLOAT64,
        Bool => code::BOOL,
        String => code::STRING,
        Date => code::DATE,
        Date32 => code::DATE32,
        DateTime => code::DATETIME,
        Uuid => code::UUID,
        Ipv4 => code::IPV4,
        Ipv6 => code::IPV6,
        Nothing => code::NOTHING,
    };
    buf.push(c);
    Ok(())
}

pub fn decode_type_descriptor(cursor: &mut Cursor<'_>) -> Result<Arc<Codec>> {
    let tag = cursor.take_byte()?;
    let codec = match tag {
        code::NOTHING => Codec::Nothing,
        code::UINT8 => Codec::Scalar(ScalarKind::UInt8),
        code::UINT16 => Codec::Scalar(ScalarKind::UInt16),
        code::UINT32 => Codec::Scalar(ScalarKind::UInt32),
        code::UINT64 => Codec::Scalar(ScalarKind::UInt64),
        code::UINT128 => Codec::Scalar(ScalarKind::UInt128),
        code::UINT256 => Codec::Scalar(ScalarKind::UInt256),
        code::INT8 => Codec::Scalar(ScalarKind::Int8),
        code::INT16 => Codec::Scalar(ScalarKind::Int16),
        code::INT32 => Codec::Scalar(ScalarKind::Int32),
        code::INT64 => Codec::Scalar(ScalarKind::Int64),
        code::INT128 => Codec::Scalar(ScalarKind::Int128),
        code::INT256 => Codec::Scalar(ScalarKind::Int256),
        code::FLOAT32 => Codec::Scalar(ScalarKind::Float32),
        code::FLOAT64 => Codec::Scalar(ScalarKind::Float64),
        code::DATE => Codec::Scalar(ScalarKind::Date),
        code::DATE32 => Codec::Scalar(ScalarKind::Date32),
        code::DATETIME => Codec::Scalar(ScalarKind::DateTime),
        code::DATETIME64 => {
            let precision = cursor.take_byte()?;
            Codec::DateTime64(DateTime64Codec { precision })
        }
        code::DATETIME64_TZ => {
            let precision = cursor.take_byte()?;
            let _tz = super::read_plain_string(cursor)?;
            Codec::DateTime64(DateTime64Codec { precision })
        }
        code::STRING => Codec::Scalar(ScalarKind::String),
        code::FIXED_STRING => {
            let n = varint::read_varint(cursor)? as usize;
            Codec::FixedString(n)
        }
        code::ENUM8 | code::ENUM16 => {
            let width = if tag == code::ENUM8 {
                EnumWidth::Eight
            } else {
                EnumWidth::Sixteen
            };
            let count = varint::read_varint(cursor)? as usize;
            let mut names = IndexMap::with_capacity(count);
            for _ in 0..count {
                let name = super::read_plain_string(cursor)?.to_owned();
                let value = match width {
                    EnumWidth::Eight => cursor.take_byte()? as i8 as i16,
                    EnumWidth::Sixteen => {
                        let b = cursor.take(2)?;
                        i16::from_le_bytes([b[0], b[1]])
                    }
                };
                names.insert(value, name);
            }
            Codec::Enum(EnumCodec { width, names })
        }
        code::DECIMAL32 | code::DECIMAL64 | code::DECIMAL128 | code::DECIMAL256 => {
            let width = match tag {
                code::DECIMAL32 => DecimalWidth::W4,
                code::DECIMAL64 => DecimalWidth::W8,
                code::DECIMAL128 => DecimalWidth::W16,
                _ => DecimalWidth::W32,
            };
            let precision = cursor.take_byte()? as u32;
            let scale = cursor.take_byte()? as u32;
            Codec::Decimal(DecimalCodec {
                precision,
                scale,
                width,
            })
        }
        code::UUID => Codec::Scalar(ScalarKind::Uuid),
        code::ARRAY => {
            let inner = decode_type_descriptor(cursor)?;
            Codec::Array(inner)
        }
        code::TUPLE => {
            let count = varint::read_varint(cursor)? as usize;
            let mut elems = Vec::with_capacity(count);
            for _ in 0..count {
                elems.push(decode_type_descriptor(cursor)?);
            }
            Codec::Tuple(TupleShape::Positional(elems))
        }
        code::TUPLE_NAMED => {
            let count = varint::read_varint(cursor)? as usize;
            let mut elems = IndexMap::with_capacity(count);
            for _ in 0..count {
                let name = super::read_plain_string(cursor)?.to_owned();
                let ty = decode_type_descriptor(cursor)?;
                elems.insert(name, ty);
            }
            Codec::Tuple(TupleShape::Named(elems))
        }
        code::NULLABLE => {
            let inner = decode_type_descriptor(cursor)?;
            Codec::Nullable(inner)
        }
        code::MAP => {
            let key = decode_type_descriptor(cursor)?;
            let value = decode_type_descriptor(cursor)?;
            Codec::Map { key, value }
        }
        code::IPV4 => Codec::Scalar(ScalarKind::Ipv4),
        code::IPV6 => Codec::Scalar(ScalarKind::Ipv6),
        code::VARIANT => {
            let count = varint::read_varint(cursor)? as usize;
            let mut types = Vec::with_capacity(count);
            for _ in 0..count {
                types.push(decode_type_descriptor(cursor)?);
            }
            Codec::Variant(VariantCodec { types })
        }
        code::DYNAMIC => Codec::Dynamic,
        code::BOOL => Codec::Scalar(ScalarKind::Bool),
        other => {
            return Err(Error::unsupported(format!("binary type code 0x{other:02X}")));
        }
    };
    Ok(Arc::new(codec))
}

/// Writes `u8` precision/scale for a bare `Decimal(P, S)` whose textual
/// form omitted precision — looked up from [`default_precision`] by the
/// caller before reaching this module; kept as a free function so
/// `registry` can share it when constructing a `DecimalCodec` for the
/// binary-descriptor path without re-deriving the width twice.
pub fn decimal_code_for(width: DecimalWidth) -> u8 {
    match width {
        DecimalWidth::W4 => code::DECIMAL32,
        DecimalWidth::W8 => code::DECIMAL64,
        DecimalWidth::W16 => code::DECIMAL128,
        DecimalWidth::W32 => code::DECIMAL256,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_nested_descriptor() {
        let codec = Codec::Nullable(Arc::new(Codec::Array(Arc::new(Codec::Scalar(ScalarKind::UInt64)))));
        let mut buf = Buffer::new();
        encode_type_descriptor(&mut buf, &codec).unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        let decoded = decode_type_descriptor(&mut cursor).unwrap();
        assert_eq!(decoded.type_name(), codec.type_name());
    }

    #[test]
    fn round_trips_decimal() {
        let codec = Codec::Decimal(DecimalCodec {
            precision: 18,
            scale: 4,
            width: DecimalWidth::W8,
        });
        let mut buf = Buffer::new();
        encode_type_descriptor(&mut buf, &codec).unwrap();
        let bytes = buf.finish();
        assert_eq!(bytes, vec![code::DECIMAL64, 18, 4]);
    }

    #[test]
    fn round_trips_named_tuple() {
        let mut elems = IndexMap::new();
        elems.insert("a".to_string(), Arc::new(Codec::Scalar(ScalarKind::Int64)));
        elems.insert("b".to_string(), Arc::new(Codec::Scalar(ScalarKind::String)));
        let codec = Codec::Tuple(TupleShape::Named(elems));
        let mut buf = Buffer::new();
        encode_type_descriptor(&mut buf, &codec).unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        let decoded = decode_type_descriptor(&mut cursor).unwrap();
        assert_eq!(decoded.type_name(), "Tuple(a Int64, b String)");
    }
}
