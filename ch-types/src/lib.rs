//! Primitive I/O for ClickHouse's binary wire formats.
//!
//! This crate is the leaf of the workspace: LEB128 varints, fixed-width
//! little-endian integer reads/writes, extended-precision (128/256-bit)
//! integers, NaN-bit-preserving floats, and length-prefixed UTF-8 strings.
//! Nothing here knows about ClickHouse's type grammar; `ch-format` builds
//! codecs on top of these primitives.

pub mod bigint;
pub mod buffer;
pub mod cursor;
pub mod error;
pub mod fixed;
pub mod float;
pub mod string;
pub mod varint;

pub use buffer::Buffer;
pub use cursor::{Cursor, DecodeOptions};
pub use error::{Error, Result};
pub use float::{Float32Value, Float64Value};
