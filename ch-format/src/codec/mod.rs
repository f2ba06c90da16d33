//! The codec tree (spec §3 "Codec", §9 "Capability polymorphism").
//!
//! `Codec` is a closed tagged enum rather than a trait object: the set of
//! codec *families* never grows at runtime (only the textual types that
//! map to them do), and a parent codec exclusively owns its children
//! through `Arc`, which both lets the registry (`crate::registry`) share
//! identical subtrees across distinct top-level types and sidesteps the
//! lifetime/object-safety friction of `Box<dyn Codec>` for no benefit.

pub mod datetime64;
pub mod decimal;
pub mod dynamic;
pub mod scalar;
pub mod type_descriptor;
pub mod variant;

use std::sync::Arc;

use ch_types::{string, varint, Buffer, Cursor};
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::value::Value;

pub use datetime64::DateTime64Codec;
pub use decimal::{DecimalCodec, DecimalWidth};
pub use scalar::ScalarKind;
pub use variant::VariantCodec;

/// An `Enum8`/`Enum16` column's optional name table (§4.3 item 3 ambient
/// supplement). The wire contract is unchanged from a bare integer codec;
/// this only adds name lookups alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCodec {
    pub width: EnumWidth,
    pub names: IndexMap<i16, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumWidth {
    Eight,
    Sixteen,
}

impl EnumCodec {
    pub fn type_name(&self) -> String {
        let family = match self.width {
            EnumWidth::Eight => "Enum8",
            EnumWidth::Sixteen => "Enum16",
        };
        let pairs: Vec<String> = self
            .names
            .iter()
            .map(|(tag, name)| format!("'{name}' = {tag}"))
            .collect();
        format!("{family}({})", pairs.join(", "))
    }

    /// Looks up the name for a decoded tag, if the column declared one.
    pub fn name_for(&self, tag: i16) -> Option<&str> {
        self.names.get(&tag).map(String::as_str)
    }
}

/// Either shape a `Tuple`'s elements can take — a tuple is fully named or
/// fully positional, never mixed (spec §4.2).
#[derive(Debug, Clone)]
pub enum TupleShape {
    Positional(Vec<Arc<Codec>>),
    Named(IndexMap<String, Arc<Codec>>),
}

/// The codec tree. See the module doc for why this is a tagged enum.
#[derive(Debug, Clone)]
pub enum Codec {
    Scalar(ScalarKind),
    Nullable(Arc<Codec>),
    Array(Arc<Codec>),
    Tuple(TupleShape),
    Map {
        key: Arc<Codec>,
        value: Arc<Codec>,
    },
    FixedString(usize),
    Enum(EnumCodec),
    DateTime64(DateTime64Codec),
    Decimal(DecimalCodec),
    Variant(VariantCodec),
    Dynamic,
    Json,
    Nothing,
}

impl Codec {
    /// Reconstructs the canonical textual type this codec was built from.
    /// Used for error messages and by the `Dynamic`/`JSON` encode path,
    /// which needs a type string to write as the binary type descriptor.
    pub fn type_name(&self) -> String {
        match self {
            Codec::Scalar(kind) => kind.type_name().to_string(),
            Codec::Nullable(inner) => format!("Nullable({})", inner.type_name()),
            Codec::Array(inner) => format!("Array({})", inner.type_name()),
            Codec::Tuple(TupleShape::Positional(elems)) => {
                let parts: Vec<String> = elems.iter().map(|c| c.type_name()).collect();
                format!("Tuple({})", parts.join(", "))
            }
            Codec::Tuple(TupleShape::Named(elems)) => {
                let parts: Vec<String> = elems
                    .iter()
                    .map(|(name, c)| format!("{name} {}", c.type_name()))
                    .collect();
                format!("Tuple({})", parts.join(", "))
            }
            Codec::Map { key, value } => format!("Map({}, {})", key.type_name(), value.type_name()),
            Codec::FixedString(n) => format!("FixedString({n})"),
            Codec::Enum(e) => e.type_name(),
            Codec::DateTime64(d) => d.type_name(),
            Codec::Decimal(d) => d.type_name(),
            Codec::Variant(v) => v.type_name(),
            Codec::Dynamic => "Dynamic".to_string(),
            Codec::Json => "JSON".to_string(),
            Codec::Nothing => "Nothing".to_string(),
        }
    }

    pub fn encode(&self, buf: &mut Buffer, value: &Value) -> Result<()> {
        match self {
            Codec::Scalar(kind) => kind.encode(buf, value),
            Codec::Nullable(inner) => encode_nullable(buf, inner, value),
            Codec::Array(inner) => encode_array(buf, inner, value),
            Codec::Tuple(shape) => encode_tuple(buf, shape, value),
            Codec::Map { key, value: val } => encode_map(buf, key, val, value),
            Codec::FixedString(n) => encode_fixed_string(buf, *n, value),
            Codec::Enum(e) => encode_enum(buf, e, value),
            Codec::DateTime64(d) => encode_datetime64(buf, d, value),
            Codec::Decimal(d) => encode_decimal(buf, d, value),
            Codec::Variant(v) => v.encode(buf, value),
            Codec::Dynamic => dynamic::encode_dynamic(buf, value),
            Codec::Json => dynamic::encode_json(buf, value),
            Codec::Nothing => Ok(()),
        }
    }

    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Value> {
        match self {
            Codec::Scalar(kind) => kind.decode(cursor),
            Codec::Nullable(inner) => decode_nullable(cursor, inner),
            Codec::Array(inner) => decode_array(cursor, inner),
            Codec::Tuple(shape) => decode_tuple(cursor, shape),
            Codec::Map { key, value } => decode_map(cursor, key, value),
            Codec::FixedString(n) => decode_fixed_string(cursor, *n),
            Codec::Enum(e) => decode_enum(cursor, e),
            Codec::DateTime64(d) => decode_datetime64(cursor, d),
            Codec::Decimal(d) => decode_decimal(cursor, d),
            Codec::Variant(v) => v.decode(cursor),
            Codec::Dynamic => dynamic::decode_dynamic(cursor),
            Codec::Json => {
                if !cursor.options().enable_json {
                    return Err(Error::unsupported("JSON"));
                }
                dynamic::decode_json(cursor)
            }
            Codec::Nothing => Ok(Value::Nothing),
        }
    }
}

// --- NullableCodec (spec §4.5) ------------------------------------------

fn encode_nullable(buf: &mut Buffer, inner: &Codec, value: &Value) -> Result<()> {
    match value {
        Value::Null => {
            buf.push(1);
            Ok(())
        }
        other => {
            buf.push(0);
            inner.encode(buf, other)
        }
    }
}

fn decode_nullable(cursor: &mut Cursor<'_>, inner: &Codec) -> Result<Value> {
    let tag = cursor.take_byte()?;
    if tag != 0 {
        Ok(Value::Null)
    } else {
        inner.decode(cursor)
    }
}

// --- ArrayCodec (spec §4.5, fast path §9) -------------------------------

fn encode_array(buf: &mut Buffer, inner: &Codec, value: &Value) -> Result<()> {
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(Error::malformed("Array", "expected an array value")),
    };
    varint::write_varint(buf, items.len() as u64);
    if let Some(kind) = fast_path_kind(inner) {
        for item in items {
            encode_fast_path_element(buf, kind, item)?;
        }
        return Ok(());
    }
    for item in items {
        inner.encode(buf, item)?;
    }
    Ok(())
}

fn decode_array(cursor: &mut Cursor<'_>, inner: &Codec) -> Result<Value> {
    let len = varint::read_varint(cursor)? as usize;
    if let Some(kind) = fast_path_kind(inner) {
        return decode_array_fast_path(cursor, kind, len);
    }
    let mut items = Vec::with_capacity(len.min(1 << 20));
    for _ in 0..len {
        items.push(inner.decode(cursor)?);
    }
    Ok(Value::Array(items))
}

/// Primitive fixed-width element widths eligible for the blit fast path
/// (spec §4.5: "Fast path for primitive numeric types"). `Bool` is
/// deliberately excluded — its wire width matches `UInt8` but its `Value`
/// shape does not, so blitting would need an extra per-element branch
/// that defeats the point of the fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FastPathKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

fn fast_path_kind(codec: &Codec) -> Option<FastPathKind> {
    match codec {
        Codec::Scalar(ScalarKind::UInt8) => Some(FastPathKind::U8),
        Codec::Scalar(ScalarKind::UInt16) => Some(FastPathKind::U16),
        Codec::Scalar(ScalarKind::UInt32) => Some(FastPathKind::U32),
        Codec::Scalar(ScalarKind::UInt64) => Some(FastPathKind::U64),
        Codec::Scalar(ScalarKind::Int8) => Some(FastPathKind::I8),
        Codec::Scalar(ScalarKind::Int16) => Some(FastPathKind::I16),
        Codec::Scalar(ScalarKind::Int32) => Some(FastPathKind::I32),
        Codec::Scalar(ScalarKind::Int64) => Some(FastPathKind::I64),
        Codec::Scalar(ScalarKind::Float32) => Some(FastPathKind::F32),
        Codec::Scalar(ScalarKind::Float64) => Some(FastPathKind::F64),
        _ => None,
    }
}

fn encode_fast_path_element(buf: &mut Buffer, kind: FastPathKind, item: &Value) -> Result<()> {
    use ch_types::fixed;
    match (kind, item) {
        (FastPathKind::U8, Value::UInt8(v)) => fixed::write_u8(buf, *v),
        (FastPathKind::U16, Value::UInt16(v)) => fixed::write_u16(buf, *v),
        (FastPathKind::U32, Value::UInt32(v)) => fixed::write_u32(buf, *v),
        (FastPathKind::U64, Value::UInt64(v)) => fixed::write_u64(buf, *v),
        (FastPathKind::I8, Value::Int8(v)) => fixed::write_i8(buf, *v),
        (FastPathKind::I16, Value::Int16(v)) => fixed::write_i16(buf, *v),
        (FastPathKind::I32, Value::Int32(v)) => fixed::write_i32(buf, *v),
        (FastPathKind::I64, Value::Int64(v)) => fixed::write_i64(buf, *v),
        (FastPathKind::F32, Value::Float32(v)) => ch_types::float::f32::encode(buf, v),
        (FastPathKind::F64, Value::Float64(v)) => ch_types::float::f64::encode(buf, v),
        _ => return Err(Error::malformed("Array", "element does not match array's declared type")),
    }
    Ok(())
}

/// Bulk-reads `len` fixed-width elements directly off the cursor's
/// backing slice instead of dispatching through [`Codec::decode`] once
/// per element (spec §4.5's "avoids per-element dispatch for large
/// numeric arrays"). This crate's `Value` is an owned tree, so "fast
/// path" here means skipping per-element codec dispatch, not an aliasing
/// zero-copy view — the latter is a streaming-layer concern (see
/// `ch_wire`'s typed-array accessors) since only the streaming reader's
/// buffer lifetime makes a borrowed view sound (§5 "Buffer aliasing
/// invariant").
fn decode_array_fast_path(cursor: &mut Cursor<'_>, kind: FastPathKind, len: usize) -> Result<Value> {
    use ch_types::fixed;
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        let v = match kind {
            FastPathKind::U8 => Value::UInt8(fixed::read_u8(cursor)?),
            FastPathKind::U16 => Value::UInt16(fixed::read_u16(cursor)?),
            FastPathKind::U32 => Value::UInt32(fixed::read_u32(cursor)?),
            FastPathKind::U64 => Value::UInt64(fixed::read_u64(cursor)?),
            FastPathKind::I8 => Value::Int8(fixed::read_i8(cursor)?),
            FastPathKind::I16 => Value::Int16(fixed::read_i16(cursor)?),
            FastPathKind::I32 => Value::Int32(fixed::read_i32(cursor)?),
            FastPathKind::I64 => Value::Int64(fixed::read_i64(cursor)?),
            FastPathKind::F32 => Value::Float32(ch_types::float::f32::decode(cursor)?),
            FastPathKind::F64 => Value::Float64(ch_types::float::f64::decode(cursor)?),
        };
        items.push(v);
    }
    Ok(Value::Array(items))
}

// --- TupleCodec (spec §4.5) ----------------------------------------------

fn encode_tuple(buf: &mut Buffer, shape: &TupleShape, value: &Value) -> Result<()> {
    match (shape, value) {
        (TupleShape::Positional(elems), Value::Tuple(items)) => {
            if elems.len() != items.len() {
                return Err(Error::malformed("Tuple", "cardinality mismatch"));
            }
            for (codec, item) in elems.iter().zip(items) {
                codec.encode(buf, item)?;
            }
            Ok(())
        }
        (TupleShape::Named(elems), Value::NamedTuple(map)) => {
            if elems.len() != map.len() || !elems.keys().all(|k| map.contains_key(k)) {
                return Err(Error::malformed("Tuple", "name set mismatch"));
            }
            for (name, codec) in elems {
                let item = map.get(name).expect("checked above");
                codec.encode(buf, item)?;
            }
            Ok(())
        }
        _ => Err(Error::malformed("Tuple", "value shape does not match tuple declaration")),
    }
}

fn decode_tuple(cursor: &mut Cursor<'_>, shape: &TupleShape) -> Result<Value> {
    match shape {
        TupleShape::Positional(elems) => {
            let mut items = Vec::with_capacity(elems.len());
            for codec in elems {
                items.push(codec.decode(cursor)?);
            }
            Ok(Value::Tuple(items))
        }
        TupleShape::Named(elems) => {
            let mut map = IndexMap::with_capacity(elems.len());
            for (name, codec) in elems {
                map.insert(name.clone(), codec.decode(cursor)?);
            }
            Ok(Value::NamedTuple(map))
        }
    }
}

// --- MapCodec (spec §4.5, §6 mapAsArray) ---------------------------------

fn encode_map(buf: &mut Buffer, key: &Codec, val: &Codec, value: &Value) -> Result<()> {
    let pairs: Vec<(&Value, &Value)> = match value {
        Value::Map(pairs) => pairs.iter().map(|(k, v)| (k, v)).collect(),
        _ => return Err(Error::malformed("Map", "expected a map value")),
    };
    varint::write_varint(buf, pairs.len() as u64);
    for (k, v) in pairs {
        key.encode(buf, k)?;
        val.encode(buf, v)?;
    }
    Ok(())
}

/// Decodes the wire's ordered pair sequence, then applies
/// [`ch_types::DecodeOptions::map_as_array`] (spec §6): `true` passes the
/// pairs straight through, preserving duplicate keys in wire order;
/// `false` (the default) collapses them last-write-wins via
/// [`collapse_map_last_wins`], matching spec Scenario D's documented
/// lossy-by-default behavior. `Value` has no separate "mapping" variant,
/// so both cases still return [`Value::Map`] — only its contents differ.
fn decode_map(cursor: &mut Cursor<'_>, key: &Codec, val: &Codec) -> Result<Value> {
    let len = varint::read_varint(cursor)? as usize;
    let map_as_array = cursor.options().map_as_array;
    let mut pairs = Vec::with_capacity(len);
    for _ in 0..len {
        let k = key.decode(cursor)?;
        let v = val.decode(cursor)?;
        pairs.push((k, v));
    }
    if map_as_array {
        Ok(Value::Map(pairs))
    } else {
        Ok(Value::Map(collapse_map_last_wins(pairs)))
    }
}

/// Collapses an ordered pair sequence into last-write-wins order,
/// matching `DecodeOptions::map_as_array = false` (spec §9 Open
/// Question: "the source assumes last-wins").
pub fn collapse_map_last_wins(pairs: Vec<(Value, Value)>) -> Vec<(Value, Value)> {
    let mut out: Vec<(Value, Value)> = Vec::with_capacity(pairs.len());
    for (k, v) in pairs {
        if let Some(existing) = out.iter_mut().find(|(ek, _)| value_key_eq(ek, &k)) {
            existing.1 = v;
        } else {
            out.push((k, v));
        }
    }
    out
}

fn value_key_eq(a: &Value, b: &Value) -> bool {
    // `Value` holds float wrappers that aren't `Eq`; keys that are valid
    // ClickHouse map keys never contain floats in practice, but fall back
    // to bit-equality for them rather than panicking.
    match (a, b) {
        (Value::Float32(x), Value::Float32(y)) => x.bits_eq(y),
        (Value::Float64(x), Value::Float64(y)) => x.bits_eq(y),
        _ => format!("{a:?}") == format!("{b:?}"),
    }
}

// --- FixedStringCodec(N) (spec §4.5) -------------------------------------

fn encode_fixed_string(buf: &mut Buffer, n: usize, value: &Value) -> Result<()> {
    let bytes: &[u8] = match value {
        Value::FixedString(b) => b,
        Value::String(s) => s.as_bytes(),
        _ => return Err(Error::malformed("FixedString", "expected bytes or a string")),
    };
    let mut padded = vec![0u8; n];
    let copy_len = bytes.len().min(n);
    padded[..copy_len].copy_from_slice(&bytes[..copy_len]);
    buf.write(&padded);
    Ok(())
}

fn decode_fixed_string(cursor: &mut Cursor<'_>, n: usize) -> Result<Value> {
    let bytes = cursor.take(n)?;
    Ok(Value::FixedString(bytes.to_vec()))
}

// --- Enum8/Enum16 (spec §4.3 item 11, §4.3 ambient item 3) ---------------

fn encode_enum(buf: &mut Buffer, e: &EnumCodec, value: &Value) -> Result<()> {
    let tag = match value {
        Value::Enum(tag) => *tag,
        _ => return Err(Error::malformed(e.type_name(), "expected an enum tag")),
    };
    match e.width {
        EnumWidth::Eight => buf.push(tag as i8 as u8),
        EnumWidth::Sixteen => buf.write(&(tag as i16).to_le_bytes()),
    }
    Ok(())
}

fn decode_enum(cursor: &mut Cursor<'_>, e: &EnumCodec) -> Result<Value> {
    let tag = match e.width {
        EnumWidth::Eight => cursor.take_byte()? as i8 as i16,
        EnumWidth::Sixteen => {
            let bytes = cursor.take(2)?;
            i16::from_le_bytes([bytes[0], bytes[1]])
        }
    };
    Ok(Value::Enum(tag))
}

// --- DateTime64 / Decimal value-shape adapters ---------------------------

fn encode_datetime64(buf: &mut Buffer, codec: &DateTime64Codec, value: &Value) -> Result<()> {
    match value {
        Value::DateTime64 { ticks, .. } => {
            codec.encode(buf, *ticks);
            Ok(())
        }
        _ => Err(Error::malformed(codec.type_name(), "expected a DateTime64 value")),
    }
}

fn decode_datetime64(cursor: &mut Cursor<'_>, codec: &DateTime64Codec) -> Result<Value> {
    let ticks = codec.decode(cursor)?;
    Ok(Value::DateTime64 {
        ticks,
        precision: codec.precision,
    })
}

fn encode_decimal(buf: &mut Buffer, codec: &DecimalCodec, value: &Value) -> Result<()> {
    match value {
        Value::Decimal(text) => codec.encode(buf, text),
        _ => Err(Error::malformed(codec.type_name(), "expected a decimal string")),
    }
}

fn decode_decimal(cursor: &mut Cursor<'_>, codec: &DecimalCodec) -> Result<Value> {
    Ok(Value::Decimal(codec.decode(cursor)?))
}

/// Writes a length-prefixed UTF-8 string without going through a scalar
/// codec — used by `JsonCodec`'s path strings and `TupleCodec`'s named
/// binary-descriptor form (§4.6), which are plain strings, not `String`
/// column values.
pub(crate) fn write_plain_string(buf: &mut Buffer, s: &str) {
    string::write_bytes(buf, s.as_bytes());
}

pub(crate) fn read_plain_string<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str> {
    Ok(string::read_str(cursor)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_array() -> Arc<Codec> {
        Arc::new(Codec::Scalar(ScalarKind::UInt16))
    }

    #[test]
    fn json_decode_respects_enable_json_option() {
        let mut buf = Buffer::new();
        varint::write_varint(&mut buf, 0); // zero paths, a valid empty JSON payload
        let bytes = buf.finish();

        let mut cursor = Cursor::new(&bytes);
        assert!(Codec::Json.decode(&mut cursor).is_ok());

        let options = ch_types::DecodeOptions {
            enable_json: false,
            ..ch_types::DecodeOptions::default()
        };
        let mut cursor = Cursor::with_options(&bytes, options);
        assert!(matches!(
            Codec::Json.decode(&mut cursor).unwrap_err(),
            Error::UnsupportedType { .. }
        ));
    }

    #[test]
    fn nullable_array_of_u16_scenario_c() {
        let codec = Codec::Nullable(Arc::new(Codec::Array(u16_array())));
        let mut buf = Buffer::new();
        codec
            .encode(
                &mut buf,
                &Value::Array(vec![Value::UInt16(10), Value::UInt16(20), Value::UInt16(30)]),
            )
            .unwrap();
        assert_eq!(
            buf.finish(),
            vec![0x00, 0x03, 0x0A, 0x00, 0x14, 0x00, 0x1E, 0x00]
        );

        let mut buf = Buffer::new();
        codec.encode(&mut buf, &Value::Null).unwrap();
        assert_eq!(buf.finish(), vec![0x01]);
    }

    #[test]
    fn map_as_array_duplicate_keys_scenario_d() {
        let bytes = [0x02u8, 0x01, 0x61, 0x01, 0x01, 0x61, 0x02];
        let codec = Codec::Map {
            key: Arc::new(Codec::Scalar(ScalarKind::String)),
            value: Arc::new(Codec::Scalar(ScalarKind::UInt8)),
        };

        // `map_as_array = true` preserves both entries in wire order.
        let options = ch_types::DecodeOptions {
            map_as_array: true,
            ..ch_types::DecodeOptions::default()
        };
        let mut cursor = Cursor::with_options(&bytes, options);
        let decoded = codec.decode(&mut cursor).unwrap();
        let pairs = match decoded {
            Value::Map(p) => p,
            _ => panic!("expected map"),
        };
        assert_eq!(
            pairs,
            vec![
                (Value::String("a".into()), Value::UInt8(1)),
                (Value::String("a".into()), Value::UInt8(2)),
            ]
        );

        // The default (`map_as_array = false`) collapses last-write-wins.
        let mut cursor = Cursor::new(&bytes);
        let decoded = codec.decode(&mut cursor).unwrap();
        match decoded {
            Value::Map(p) => assert_eq!(p, vec![(Value::String("a".into()), Value::UInt8(2))]),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn fixed_string_pads_and_truncates() {
        let codec = Codec::FixedString(4);
        let mut buf = Buffer::new();
        codec.encode(&mut buf, &Value::String("ab".into())).unwrap();
        assert_eq!(buf.finish(), vec![b'a', b'b', 0, 0]);

        let mut buf = Buffer::new();
        codec.encode(&mut buf, &Value::String("abcdef".into())).unwrap();
        let bytes = buf.finish();
        assert_eq!(bytes, vec![b'a', b'b', b'c', b'd']);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(codec.decode(&mut cursor).unwrap(), Value::FixedString(vec![b'a', b'b', b'c', b'd']));
    }
}
