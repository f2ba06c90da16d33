//! Streaming frame reader and encoder for ClickHouse's `RowBinary` /
//! `RowBinaryWithNamesAndTypes` wire formats.
//!
//! This crate ties two leaf crates together over an asynchronous byte
//! source: [`ch_types`] supplies the primitive I/O (varints, fixed-width
//! integers, NaN-preserving floats, length-prefixed strings), and
//! [`ch_format`] builds those primitives into a codec for every
//! ClickHouse type and resolves textual type descriptors through a
//! shared, cached registry. Neither of those crates knows about chunk
//! boundaries or suspension; that is entirely this crate's job.
//!
//! [`reader::StreamReader`] pulls chunks from a [`tokio_stream::Stream`]
//! of [`bytes::Bytes`], retrying a row decode on underflow until enough
//! bytes have arrived, and yields decoded rows in batches aligned to
//! natural chunk boundaries. [`encoder::StreamEncoder`] is the inverse:
//! it accumulates encoded rows until a configured chunk budget is
//! crossed, then hands the caller a completed chunk — with both a
//! zero-suspension synchronous iterator and an async `Stream` front end
//! over the same core.

pub mod config;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod reader;

/// Re-exports of the types most callers need, so `use ch_wire::prelude::*`
/// is enough to drive a full encode or decode loop.
pub mod prelude {
    pub use crate::config::{DecodeOptions, StreamConfig};
    pub use crate::encoder::{EncodeStream, StreamEncoder, SyncChunkEncoder};
    pub use crate::error::{Error, Result};
    pub use crate::frame::RowSchema;
    pub use crate::reader::{Row, StreamReader};

    pub use ch_format::{Codec, CodecRegistry, ScalarKind, Value};
}
