//! The in-memory value shape every codec encodes from / decodes to.
//!
//! ClickHouse's type system is open-ended but the set of *shapes* a value
//! can take is closed (§9 "capability polymorphism"), so this is a single
//! tagged enum rather than a trait. Container variants nest `Value` rather
//! than anything codec-specific, matching the data model's description of
//! values as independent of the codec that produced them.

use std::net::{Ipv4Addr, Ipv6Addr};

use ch_types::{Float32Value, Float64Value};
use ethnum::{I256, U256};
use indexmap::IndexMap;

/// A decoded (or to-be-encoded) ClickHouse value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    UInt256(U256),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Int256(I256),
    Float32(Float32Value),
    Float64(Float64Value),
    /// `String` — owned, validated UTF-8.
    String(String),
    /// `FixedString(N)` — always exactly `N` raw bytes, not UTF-8-decoded
    /// (spec §4.5: "the caller decides").
    FixedString(Vec<u8>),
    /// Canonical hyphenated lowercase form, e.g.
    /// `"936da01f-9abd-4d9d-80c7-02af85c822a8"`.
    Uuid(String),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// Days since the Unix epoch.
    Date(u16),
    /// Days since the Unix epoch, signed (pre-1970 dates).
    Date32(i32),
    /// Seconds since the Unix epoch.
    DateTime(u32),
    /// Sub-second ticks since the Unix epoch; `precision` is carried on the
    /// value because arithmetic and formatting are ambiguous without it
    /// (§3 "DateTime64 value").
    DateTime64 { ticks: i64, precision: u8 },
    /// In-memory decimal form: a decimal string (§3 "Decimal value").
    Decimal(String),
    /// The bare wire tag of an `Enum8`/`Enum16` column.
    Enum(i16),
    Array(Vec<Value>),
    /// Positional `Tuple`.
    Tuple(Vec<Value>),
    /// Named `Tuple` — order is the declared column order, not
    /// insertion/alphabetical order.
    NamedTuple(IndexMap<String, Value>),
    /// `Map` decoded as an ordered pair sequence (duplicate-key
    /// preserving); the default decode additionally collapses this into
    /// a mapping for convenience when the registry is driven with
    /// `map_as_array = false` (see `MapCodec::decode`).
    Map(Vec<(Value, Value)>),
    /// `Variant(T0, T1, ...)` — a discriminated union, tagged with the
    /// index of the alternative it holds.
    Variant { type_index: u8, value: Box<Value> },
    /// `Dynamic` — a self-describing value, carrying its own textual type.
    Dynamic {
        type_name: String,
        value: Box<Value>,
    },
    /// `JSON` — a path-typed map of dynamics, insertion-ordered.
    Json(IndexMap<String, Value>),
    /// The `Nothing` type's sole inhabitant.
    Nothing,
}

impl Value {
    /// True for [`Value::Null`] — the only value [`crate::codec::NullableCodec`]
    /// accepts in place of its inner type.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

macro_rules! from_numeric {
    ($variant:ident, $t:ty) => {
        impl From<$t> for Value {
            fn from(value: $t) -> Self {
                Value::$variant(value)
            }
        }
    };
}

from_numeric!(UInt8, u8);
from_numeric!(UInt16, u16);
from_numeric!(UInt32, u32);
from_numeric!(UInt64, u64);
from_numeric!(UInt128, u128);
from_numeric!(Int8, i8);
from_numeric!(Int16, i16);
from_numeric!(Int32, i32);
from_numeric!(Int64, i64);
from_numeric!(Int128, i128);
