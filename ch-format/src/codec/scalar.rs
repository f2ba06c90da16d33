//! Fixed-width and self-contained scalar codecs (spec §4.4).
//!
//! These are the leaves of the codec tree: every one of them reads or
//! writes itself without constructing or consulting any child codec.

use std::net::{Ipv4Addr, Ipv6Addr};

use ch_types::{bigint, fixed, float, string, Buffer, Cursor, Float32Value, Float64Value};
use ethnum::{I256, U256};

use crate::error::{Error, Result};
use crate::value::Value;

/// The closed set of zero-argument scalar types (§4.3 item 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    Float32,
    Float64,
    Bool,
    String,
    Date,
    Date32,
    DateTime,
    Uuid,
    Ipv4,
    Ipv6,
    Nothing,
}

impl ScalarKind {
    /// Looks up a zero-argument scalar by its exact textual name, or
    /// `None` if `name` dispatches to something else (a container, a
    /// parametric type, or nothing known at all).
    pub fn from_name(name: &str) -> Option<Self> {
        use ScalarKind::*;
        Some(match name {
            "UInt8" => UInt8,
            "UInt16" => UInt16,
            "UInt32" => UInt32,
            "UInt64" => UInt64,
            "UInt128" => UInt128,
            "UInt256" => UInt256,
            "Int8" => Int8,
            "Int16" => Int16,
            "Int32" => Int32,
            "Int64" => Int64,
            "Int128" => Int128,
            "Int256" => Int256,
            "Float32" => Float32,
            "Float64" => Float64,
            "Bool" => Bool,
            "String" => String,
            "Date" => Date,
            "Date32" => Date32,
            "DateTime" => DateTime,
            "UUID" => Uuid,
            "IPv4" => Ipv4,
            "IPv6" => Ipv6,
            "Nothing" => Nothing,
            _ => return None,
        })
    }

    pub fn type_name(&self) -> &'static str {
        use ScalarKind::*;
        match self {
            UInt8 => "UInt8",
            UInt16 => "UInt16",
            UInt32 => "UInt32",
            UInt64 => "UInt64",
            UInt128 => "UInt128",
            UInt256 => "UInt256",
            Int8 => "Int8",
            Int16 => "Int16",
            Int32 => "Int32",
            Int64 => "Int64",
            Int128 => "Int128",
            Int256 => "Int256",
            Float32 => "Float32",
            Float64 => "Float64",
            Bool => "Bool",
            String => "String",
            Date => "Date",
            Date32 => "Date32",
            DateTime => "DateTime",
            Uuid => "UUID",
            Ipv4 => "IPv4",
            Ipv6 => "IPv6",
            Nothing => "Nothing",
        }
    }

    pub fn encode(&self, buf: &mut Buffer, value: &Value) -> Result<()> {
        use ScalarKind::*;
        match (self, value) {
            (UInt8, Value::UInt8(v)) => fixed::write_u8(buf, *v),
            (UInt16, Value::UInt16(v)) => fixed::write_u16(buf, *v),
            (UInt32, Value::UInt32(v)) => fixed::write_u32(buf, *v),
            (UInt64, Value::UInt64(v)) => fixed::write_u64(buf, *v),
            (UInt128, Value::UInt128(v)) => bigint::write_u128(buf, *v),
            (UInt256, Value::UInt256(v)) => bigint::write_u256(buf, *v),
            (Int8, Value::Int8(v)) => fixed::write_i8(buf, *v),
            (Int16, Value::Int16(v)) => fixed::write_i16(buf, *v),
            (Int32, Value::Int32(v)) => fixed::write_i32(buf, *v),
            (Int64, Value::Int64(v)) => fixed::write_i64(buf, *v),
            (Int128, Value::Int128(v)) => bigint::write_i128(buf, *v),
            (Int256, Value::Int256(v)) => bigint::write_i256(buf, *v),
            (Float32, Value::Float32(v)) => float::f32::encode(buf, v),
            (Float64, Value::Float64(v)) => float::f64::encode(buf, v),
            (Bool, Value::Bool(v)) => fixed::write_u8(buf, u8::from(*v)),
            (String, Value::String(v)) => string::write_bytes(buf, v.as_bytes()),
            (Date, Value::Date(v)) => fixed::write_u16(buf, *v),
            (Date32, Value::Date32(v)) => fixed::write_i32(buf, *v),
            (DateTime, Value::DateTime(v)) => fixed::write_u32(buf, *v),
            (Uuid, Value::Uuid(v)) => encode_uuid(buf, v)?,
            (Ipv4, Value::Ipv4(v)) => encode_ipv4(buf, v),
            (Ipv6, Value::Ipv6(v)) => encode_ipv6(buf, v),
            (Nothing, _) => {}
            _ => {
                return Err(Error::malformed(
                    self.type_name(),
                    format!("value shape does not match {}", self.type_name()),
                ))
            }
        }
        Ok(())
    }

    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Value> {
        use ScalarKind::*;
        Ok(match self {
            UInt8 => Value::UInt8(fixed::read_u8(cursor)?),
            UInt16 => Value::UInt16(fixed::read_u16(cursor)?),
            UInt32 => Value::UInt32(fixed::read_u32(cursor)?),
            UInt64 => Value::UInt64(fixed::read_u64(cursor)?),
            UInt128 => Value::UInt128(bigint::read_u128(cursor)?),
            UInt256 => Value::UInt256(bigint::read_u256(cursor)?),
            Int8 => Value::Int8(fixed::read_i8(cursor)?),
            Int16 => Value::Int16(fixed::read_i16(cursor)?),
            Int32 => Value::Int32(fixed::read_i32(cursor)?),
            Int64 => Value::Int64(fixed::read_i64(cursor)?),
            Int128 => Value::Int128(bigint::read_i128(cursor)?),
            Int256 => Value::Int256(bigint::read_i256(cursor)?),
            Float32 => Value::Float32(float::f32::decode(cursor)?),
            Float64 => Value::Float64(float::f64::decode(cursor)?),
            Bool => Value::Bool(fixed::read_u8(cursor)? != 0),
            String => Value::String(decode_string(cursor)?),
            Date => Value::Date(fixed::read_u16(cursor)?),
            Date32 => Value::Date32(fixed::read_i32(cursor)?),
            DateTime => Value::DateTime(fixed::read_u32(cursor)?),
            Uuid => Value::Uuid(decode_uuid(cursor)?),
            Ipv4 => Value::Ipv4(decode_ipv4(cursor)?),
            Ipv6 => Value::Ipv6(decode_ipv6(cursor)?),
            Nothing => Value::Nothing,
        })
    }
}

/// Decodes a `String` column honoring
/// [`ch_types::DecodeOptions::validate_utf8`] (SPEC_FULL ambient config):
/// when set (the default), goes through [`string::read_str`]'s validating
/// path; when cleared, reads the raw length-prefixed body without
/// validation for callers who will re-validate downstream themselves.
fn decode_string(cursor: &mut Cursor<'_>) -> Result<String> {
    if cursor.options().validate_utf8 {
        return Ok(string::read_str(cursor)?.to_owned());
    }
    let bytes = string::read_bytes(cursor)?;
    // Safety: the caller opted out of UTF-8 validation via
    // `DecodeOptions::validate_utf8 = false` and takes responsibility for
    // re-validating (or never inspecting as `str`) downstream.
    Ok(unsafe { std::string::String::from_utf8_unchecked(bytes.to_vec()) })
}

// --- UUID (spec §4.4 "UUID") --------------------------------------------
//
// Wire layout: two little-endian u64 halves, each half's *bytes* in the
// reverse of the textual byte order. Implemented with 256-entry lookup
// tables rather than a generic hex crate, matching the source's explicit
// choice to avoid per-call allocation/validation overhead on a type this
// hot in row-oriented workloads.

const HEX_INVALID: u8 = 0xFF;

fn nibble_lut() -> [u8; 256] {
    let mut table = [HEX_INVALID; 256];
    let mut i = 0u8;
    loop {
        let v = match i {
            b'0'..=b'9' => Some(i - b'0'),
            b'a'..=b'f' => Some(i - b'a' + 10),
            b'A'..=b'F' => Some(i - b'A' + 10),
            _ => None,
        };
        if let Some(v) = v {
            table[i as usize] = v;
        }
        if i == 255 {
            break;
        }
        i += 1;
    }
    table
}

fn byte_to_hex_lut() -> [[u8; 2]; 256] {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut table = [[0u8; 2]; 256];
    let mut i = 0usize;
    while i < 256 {
        table[i] = [DIGITS[i >> 4], DIGITS[i & 0xF]];
        i += 1;
    }
    table
}

fn encode_uuid(buf: &mut Buffer, text: &str) -> Result<()> {
    if text.len() != 36 {
        return Err(Error::malformed("UUID", format!("expected 36 characters, got {}", text.len())));
    }
    let bytes = text.as_bytes();
    let dash_ok = bytes[8] == b'-' && bytes[13] == b'-' && bytes[18] == b'-' && bytes[23] == b'-';
    if !dash_ok {
        return Err(Error::malformed("UUID", "missing hyphen at expected position"));
    }
    let lut = nibble_lut();
    let hex_positions: [usize; 32] = [
        0, 1, 2, 3, 4, 5, 6, 7, 9, 10, 11, 12, 14, 15, 16, 17, 19, 20, 21, 22, 24, 25, 26, 27, 28,
        29, 30, 31, 32, 33, 34, 35,
    ];
    let mut nibbles = [0u8; 32];
    for (i, &pos) in hex_positions.iter().enumerate() {
        let n = lut[bytes[pos] as usize];
        if n == HEX_INVALID {
            return Err(Error::malformed("UUID", "invalid hex character"));
        }
        nibbles[i] = n;
    }
    let mut raw = [0u8; 16];
    for i in 0..16 {
        raw[i] = (nibbles[2 * i] << 4) | nibbles[2 * i + 1];
    }
    // Each 8-byte half is written with its bytes in reverse textual order.
    let mut first = [0u8; 8];
    first.copy_from_slice(&raw[0..8]);
    first.reverse();
    let mut second = [0u8; 8];
    second.copy_from_slice(&raw[8..16]);
    second.reverse();
    buf.write(&first);
    buf.write(&second);
    Ok(())
}

fn decode_uuid(cursor: &mut Cursor<'_>) -> Result<String> {
    let mut first = cursor.take(8)?.to_vec();
    let mut second = cursor.take(8)?.to_vec();
    first.reverse();
    second.reverse();
    let mut raw = [0u8; 16];
    raw[0..8].copy_from_slice(&first);
    raw[8..16].copy_from_slice(&second);
    let hex = byte_to_hex_lut();
    let mut out = String::with_capacity(36);
    let groups: [(usize, usize); 5] = [(0, 4), (4, 6), (6, 8), (8, 10), (10, 16)];
    for (idx, (start, end)) in groups.iter().enumerate() {
        if idx > 0 {
            out.push('-');
        }
        for &b in &raw[*start..*end] {
            let [hi, lo] = hex[b as usize];
            out.push(hi as char);
            out.push(lo as char);
        }
    }
    Ok(out)
}

// --- IPv4 ----------------------------------------------------------------

fn encode_ipv4(buf: &mut Buffer, addr: &Ipv4Addr) {
    let packed = u32::from_be_bytes(addr.octets());
    fixed::write_u32(buf, packed);
}

fn decode_ipv4(cursor: &mut Cursor<'_>) -> Result<Ipv4Addr> {
    let packed = fixed::read_u32(cursor)?;
    Ok(Ipv4Addr::from(packed.to_be_bytes()))
}

/// Parses `a.b.c.d` without a split/map allocation (spec §4.4), each octet
/// checked to be in `0..=255`.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut idx = 0;
    let mut current: u32 = 0;
    let mut has_digit = false;
    for c in text.chars() {
        match c {
            '0'..='9' => {
                has_digit = true;
                current = current * 10 + c.to_digit(10).unwrap();
                if current > 255 {
                    return Err(Error::malformed("IPv4", format!("octet {current} out of range")));
                }
            }
            '.' => {
                if !has_digit || idx >= 4 {
                    return Err(Error::malformed("IPv4", "malformed address"));
                }
                octets[idx] = current as u8;
                idx += 1;
                current = 0;
                has_digit = false;
            }
            _ => return Err(Error::malformed("IPv4", "unexpected character")),
        }
    }
    if !has_digit || idx != 3 {
        return Err(Error::malformed("IPv4", "expected four octets"));
    }
    octets[3] = current as u8;
    Ok(Ipv4Addr::from(octets))
}

// --- IPv6 ------------------------------------------------------------------

fn encode_ipv6(buf: &mut Buffer, addr: &Ipv6Addr) {
    buf.write(&addr.octets());
}

fn decode_ipv6(cursor: &mut Cursor<'_>) -> Result<Ipv6Addr> {
    let bytes = cursor.take(16)?;
    let mut octets = [0u8; 16];
    octets.copy_from_slice(bytes);
    Ok(Ipv6Addr::from(octets))
}

/// Parses textual IPv6 including `::` shorthand expansion (spec §4.4).
pub fn parse_ipv6(text: &str) -> Result<Ipv6Addr> {
    let mut halves = text.splitn(2, "::");
    let left = halves.next().unwrap_or("");
    let right_opt = halves.next();
    if text.matches("::").count() > 1 {
        return Err(Error::malformed("IPv6", "multiple '::' shorthand markers"));
    }

    let parse_groups = |s: &str| -> Result<Vec<u16>> {
        if s.is_empty() {
            return Ok(Vec::new());
        }
        s.split(':')
            .map(|g| {
                u16::from_str_radix(g, 16)
                    .map_err(|_| Error::malformed("IPv6", format!("invalid hex group '{g}'")))
            })
            .collect()
    };

    let mut groups: Vec<u16> = match right_opt {
        None => {
            let g = parse_groups(left)?;
            if g.len() != 8 {
                return Err(Error::malformed("IPv6", "expected 8 groups without '::'"));
            }
            g
        }
        Some(right) => {
            let left_groups = parse_groups(left)?;
            let right_groups = parse_groups(right)?;
            if left_groups.len() + right_groups.len() > 8 {
                return Err(Error::malformed("IPv6", "too many groups for '::' shorthand"));
            }
            let zeros = 8 - left_groups.len() - right_groups.len();
            let mut g = left_groups;
            g.extend(std::iter::repeat(0u16).take(zeros));
            g.extend(right_groups);
            g
        }
    };
    if groups.len() != 8 {
        return Err(Error::malformed("IPv6", "expected 8 groups total"));
    }
    let mut octets = [0u8; 16];
    for (i, group) in groups.drain(..).enumerate() {
        octets[2 * i..2 * i + 2].copy_from_slice(&group.to_be_bytes());
    }
    Ok(Ipv6Addr::from(octets))
}

pub use ScalarKind as Kind;

/// Casts a decoded `Int128`/`Int256` to its unsigned counterpart's
/// bit-identical representation, used by callers that want to present a
/// signed type's raw limbs (kept for symmetry with [`ch_types::bigint`],
/// not exercised by the registry dispatch itself).
pub fn int256_to_u256(value: I256) -> U256 {
    U256::from_le_bytes(value.to_le_bytes())
}
