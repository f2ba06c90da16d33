//! `Dynamic` and `JSON` (spec §4.7), plus implicit type inference.
//!
//! Both types carry a binary type descriptor (§4.6) ahead of every value
//! instead of relying on a declared column type, which is what lets them
//! hold heterogeneous data. `Dynamic` is a single self-describing value;
//! `JSON` is an insertion-ordered map of paths to self-describing values.

use std::sync::Arc;

use ch_types::{varint, Buffer, Cursor};
use indexmap::IndexMap;

use super::type_descriptor::{self, decode_type_descriptor, encode_type_descriptor};
use super::{Codec, DateTime64Codec, DecimalCodec, DecimalWidth, ScalarKind, TupleShape};
use crate::error::{Error, Result};
use crate::grammar::{self, TupleElement};
use crate::value::Value;

// --- DynamicCodec ---------------------------------------------------------

pub fn encode_dynamic(buf: &mut Buffer, value: &Value) -> Result<()> {
    match value {
        Value::Null => encode_type_descriptor(buf, &Codec::Nothing),
        Value::Dynamic { type_name, value } => {
            let codec = resolve_simple_type(type_name)?;
            encode_type_descriptor(buf, &codec)?;
            codec.encode(buf, value)
        }
        other => {
            let codec = infer_type(other)?;
            encode_type_descriptor(buf, &codec)?;
            codec.encode(buf, other)
        }
    }
}

pub fn decode_dynamic(cursor: &mut Cursor<'_>) -> Result<Value> {
    let codec = decode_type_descriptor(cursor)?;
    if matches!(*codec, Codec::Nothing) {
        return Ok(Value::Null);
    }
    let value = codec.decode(cursor)?;
    Ok(Value::Dynamic {
        type_name: codec.type_name(),
        value: Box::new(value),
    })
}

// --- JsonCodec -------------------------------------------------------------

pub fn encode_json(buf: &mut Buffer, value: &Value) -> Result<()> {
    let paths = match value {
        Value::Json(paths) => paths,
        _ => return Err(Error::malformed("JSON", "expected a JSON path map")),
    };
    varint::write_varint(buf, paths.len() as u64);
    for (path, val) in paths {
        super::write_plain_string(buf, path);
        if val.is_null() {
            encode_type_descriptor(buf, &Codec::Nothing)?;
            continue;
        }
        match val {
            Value::Dynamic { type_name, value } => {
                let codec = resolve_simple_type(type_name)?;
                encode_type_descriptor(buf, &codec)?;
                codec.encode(buf, value)?;
            }
            other => {
                let codec = infer_type(other)?;
                encode_type_descriptor(buf, &codec)?;
                codec.encode(buf, other)?;
            }
        }
    }
    Ok(())
}

pub fn decode_json(cursor: &mut Cursor<'_>) -> Result<Value> {
    let count = varint::read_varint(cursor)? as usize;
    let mut paths = IndexMap::with_capacity(count);
    for _ in 0..count {
        let path = super::read_plain_string(cursor)?.to_owned();
        let codec = decode_type_descriptor(cursor)?;
        let value = if matches!(*codec, Codec::Nothing) {
            Value::Null
        } else {
            codec.decode(cursor)?
        };
        paths.insert(path, value);
    }
    Ok(Value::Json(paths))
}

// --- Type inference (spec §4.7) --------------------------------------------

/// Infers a wire type for an implicit `Dynamic`/`JSON` write.
pub fn infer_type(value: &Value) -> Result<Codec> {
    use ScalarKind::*;
    Ok(match value {
        Value::Null => Codec::Nothing,
        Value::Bool(_) => Codec::Scalar(Bool),
        Value::String(_) => Codec::Scalar(String),
        Value::FixedString(bytes) => Codec::FixedString(bytes.len()),
        Value::UInt8(_) => Codec::Scalar(UInt8),
        Value::UInt16(_) => Codec::Scalar(UInt16),
        Value::UInt32(_) => Codec::Scalar(UInt32),
        Value::UInt64(_) => Codec::Scalar(UInt64),
        Value::UInt128(_) => Codec::Scalar(UInt128),
        Value::UInt256(_) => Codec::Scalar(UInt256),
        Value::Int8(_) => Codec::Scalar(Int8),
        Value::Int16(_) => Codec::Scalar(Int16),
        Value::Int32(_) => Codec::Scalar(Int32),
        Value::Int64(_) => Codec::Scalar(Int64),
        // "big integer -> Int128 if it fits, else Int256" (spec §4.7) only
        // bites when the caller already hands in a wider-than-64-bit
        // value — Rust's `Value::Int64` can never overflow `Int64` itself.
        Value::Int128(_) => Codec::Scalar(Int128),
        Value::Int256(_) => Codec::Scalar(Int256),
        // "floating point -> Int64 when integral, else Float64".
        Value::Float32(v) => infer_float(v.value() as f64, ScalarKind::Float32),
        Value::Float64(v) => infer_float(v.value(), ScalarKind::Float64),
        Value::Uuid(_) => Codec::Scalar(Uuid),
        Value::Ipv4(_) => Codec::Scalar(Ipv4),
        Value::Ipv6(_) => Codec::Scalar(Ipv6),
        // "calendar value -> DateTime64(3)".
        Value::Date(_) | Value::Date32(_) | Value::DateTime(_) => {
            Codec::DateTime64(DateTime64Codec { precision: 3 })
        }
        Value::DateTime64 { precision, .. } => Codec::DateTime64(DateTime64Codec {
            precision: *precision,
        }),
        Value::Decimal(text) => infer_decimal(text),
        Value::Array(items) => {
            let inner = match items.first() {
                None => Codec::Nothing,
                Some(first) => infer_type(first)?,
            };
            Codec::Array(Arc::new(inner))
        }
        other => {
            return Err(Error::UnsupportedInference {
                reason: format!("{other:?} has no inferable Dynamic/JSON type"),
            })
        }
    })
}

fn infer_float(numeric: f64, float_kind: ScalarKind) -> Codec {
    if numeric.is_finite() && numeric.fract() == 0.0 && numeric.abs() <= i64::MAX as f64 {
        Codec::Scalar(ScalarKind::Int64)
    } else {
        Codec::Scalar(float_kind)
    }
}

fn infer_decimal(text: &str) -> Codec {
    let scale = text
        .split_once('.')
        .map(|(_, frac)| frac.len() as u32)
        .unwrap_or(0);
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count() as u32;
    let width = DecimalWidth::from_precision(digits.max(scale));
    Codec::Decimal(DecimalCodec {
        precision: type_descriptor::default_precision(width),
        scale,
        width,
    })
}

/// Resolves a textual type to a [`Codec`] for the explicit
/// `Dynamic`/`JSON` write path, covering exactly the subset the binary
/// type descriptor (§4.6) can represent. This intentionally does not go
/// through `crate::registry` — the registry additionally resolves
/// `LowCardinality`/`Nested`/geo aliases that never appear as a
/// `Dynamic`'s declared type on the wire, and routing through it here
/// would create a dependency cycle (`registry` itself builds on this
/// module for `Dynamic`/`JSON` columns).
pub fn resolve_simple_type(type_name: &str) -> Result<Codec> {
    let node = grammar::parse_type(type_name)?;
    if let Some(kind) = ScalarKind::from_name(&node.name) {
        return Ok(Codec::Scalar(kind));
    }
    match node.name.as_str() {
        "Nullable" => {
            let inner = node
                .args
                .first()
                .ok_or_else(|| Error::malformed(type_name, "Nullable requires one argument"))?;
            Ok(Codec::Nullable(Arc::new(resolve_simple_type(inner)?)))
        }
        "Array" => {
            let inner = node
                .args
                .first()
                .ok_or_else(|| Error::malformed(type_name, "Array requires one argument"))?;
            Ok(Codec::Array(Arc::new(resolve_simple_type(inner)?)))
        }
        "Map" => {
            if node.args.len() != 2 {
                return Err(Error::malformed(type_name, "Map requires two arguments"));
            }
            Ok(Codec::Map {
                key: Arc::new(resolve_simple_type(&node.args[0])?),
                value: Arc::new(resolve_simple_type(&node.args[1])?),
            })
        }
        "FixedString" => {
            let n: usize = node
                .args
                .first()
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| Error::malformed(type_name, "FixedString requires a numeric length"))?;
            Ok(Codec::FixedString(n))
        }
        "DateTime64" => {
            let precision: u8 = node
                .args
                .first()
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| Error::malformed(type_name, "DateTime64 requires a precision"))?;
            Ok(Codec::DateTime64(DateTime64Codec { precision }))
        }
        "Tuple" => {
            let elements: Vec<TupleElement> = node
                .args
                .iter()
                .map(|raw| grammar::classify_tuple_element(raw))
                .collect();
            let all_named = !elements.is_empty()
                && elements
                    .iter()
                    .all(|e| matches!(e, TupleElement::Named(..)));
            if all_named {
                let mut map = IndexMap::with_capacity(elements.len());
                for e in elements {
                    if let TupleElement::Named(name, ty) = e {
                        map.insert(name, Arc::new(resolve_simple_type(&ty)?));
                    }
                }
                Ok(Codec::Tuple(TupleShape::Named(map)))
            } else {
                let mut elems = Vec::with_capacity(elements.len());
                for e in elements {
                    let ty = match e {
                        TupleElement::Positional(t) => t,
                        TupleElement::Named(name, ty) => format!("{name} {ty}"),
                    };
                    elems.push(Arc::new(resolve_simple_type(&ty)?));
                }
                Ok(Codec::Tuple(TupleShape::Positional(elems)))
            }
        }
        name if name.starts_with("Decimal") => {
            let (precision, scale) = parse_decimal_args(name, &node.args)?;
            let width = DecimalWidth::from_precision(precision);
            Ok(Codec::Decimal(DecimalCodec {
                precision,
                scale,
                width,
            }))
        }
        "Variant" => {
            let mut types = Vec::with_capacity(node.args.len());
            for arg in &node.args {
                types.push(Arc::new(resolve_simple_type(arg)?));
            }
            Ok(Codec::Variant(super::VariantCodec { types }))
        }
        "Dynamic" => Ok(Codec::Dynamic),
        _ => Err(Error::unsupported(type_name)),
    }
}

fn parse_decimal_args(name: &str, args: &[String]) -> Result<(u32, u32)> {
    match name {
        "Decimal" => {
            if args.len() != 2 {
                return Err(Error::malformed(name, "Decimal requires (precision, scale)"));
            }
            let precision: u32 = args[0]
                .parse()
                .map_err(|_| Error::malformed(name, "non-numeric precision"))?;
            let scale: u32 = args[1]
                .parse()
                .map_err(|_| Error::malformed(name, "non-numeric scale"))?;
            Ok((precision, scale))
        }
        "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
            let default = type_descriptor::default_precision(match name {
                "Decimal32" => DecimalWidth::W4,
                "Decimal64" => DecimalWidth::W8,
                "Decimal128" => DecimalWidth::W16,
                _ => DecimalWidth::W32,
            });
            let scale: u32 = args
                .first()
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| Error::malformed(name, "requires a scale argument"))?;
            Ok((default, scale))
        }
        _ => Err(Error::unsupported(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_null_as_nothing() {
        let mut buf = Buffer::new();
        encode_dynamic(&mut buf, &Value::Null).unwrap();
        assert_eq!(buf.finish(), vec![0x00]);
    }

    #[test]
    fn infers_string_and_round_trips() {
        let mut buf = Buffer::new();
        let value = Value::String("hi".into());
        encode_dynamic(&mut buf, &value).unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        let decoded = decode_dynamic(&mut cursor).unwrap();
        match decoded {
            Value::Dynamic { type_name, value: v } => {
                assert_eq!(type_name, "String");
                assert_eq!(*v, value);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn infers_empty_array_as_array_of_nothing() {
        let codec = infer_type(&Value::Array(vec![])).unwrap();
        assert_eq!(codec.type_name(), "Array(Nothing)");
    }

    #[test]
    fn json_null_path_emits_only_nothing_code() {
        let mut paths = IndexMap::new();
        paths.insert("a".to_string(), Value::Null);
        let mut buf = Buffer::new();
        encode_json(&mut buf, &Value::Json(paths)).unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        let decoded = decode_json(&mut cursor).unwrap();
        match decoded {
            Value::Json(map) => assert_eq!(map.get("a"), Some(&Value::Null)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn explicit_type_overrides_inference() {
        let mut buf = Buffer::new();
        let value = Value::Dynamic {
            type_name: "Int32".to_string(),
            value: Box::new(Value::Int32(7)),
        };
        encode_dynamic(&mut buf, &value).unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        let decoded = decode_dynamic(&mut cursor).unwrap();
        match decoded {
            Value::Dynamic { type_name, value } => {
                assert_eq!(type_name, "Int32");
                assert_eq!(*value, Value::Int32(7));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
