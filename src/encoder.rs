//! The streaming frame encoder (spec §4.9).
//!
//! Buffers encoded rows until the scratch buffer crosses
//! [`StreamConfig::yield_threshold`], then yields a byte chunk and resets.
//! The single suspension point (§5) is the consumer awaiting a chunk, not
//! anything internal to encoding — [`SyncChunkEncoder`] proves this by
//! never using `await` at all, and [`EncodeStream`] suspends only on its
//! row source's `poll_next`.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use ch_format::{Codec, Value};
use ch_types::Buffer;
use tokio_stream::Stream;

use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::frame::RowSchema;

/// Accumulates encoded rows into a growable buffer and hands out
/// completed chunks. This is the synchronous core both the sync-iterator
/// and async-stream encoders above it share; it never itself suspends.
pub struct StreamEncoder {
    buffer: Buffer,
    config: StreamConfig,
}

impl StreamEncoder {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            buffer: Buffer::with_capacity(config.chunk_budget),
            config,
        }
    }

    /// Writes the `RowBinaryWithNamesAndTypes` preamble: column count,
    /// names, then types (spec §6). Bare `RowBinary` skips this call
    /// entirely.
    pub fn write_header(&mut self, schema: &RowSchema) {
        ch_types::varint::write_varint(&mut self.buffer, schema.len() as u64);
        for name in schema.names() {
            ch_types::string::write_bytes(&mut self.buffer, name.as_bytes());
        }
        for codec in schema.codecs() {
            ch_types::string::write_bytes(&mut self.buffer, codec.type_name().as_bytes());
        }
    }

    /// Encodes one row's values against `schema`'s codecs, in column
    /// order. On error the partially-written row bytes remain in the
    /// buffer — per spec §7 "a failed row aborts the whole stream", the
    /// caller is expected to stop calling this encoder, not to try to
    /// excise the partial row.
    pub fn write_row(&mut self, schema: &RowSchema, values: &[Value]) -> Result<()> {
        if values.len() != schema.len() {
            return Err(Error::Header {
                reason: format!(
                    "row has {} values but schema declares {} columns",
                    values.len(),
                    schema.len()
                ),
            });
        }
        for (codec, value) in schema.codecs().zip(values) {
            codec.encode(&mut self.buffer, value)?;
        }
        Ok(())
    }

    /// True once the buffer has crossed the configured yield threshold.
    pub fn should_yield(&self) -> bool {
        self.buffer.len() >= self.config.yield_threshold()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Takes whatever has been written so far as a chunk, resetting the
    /// internal buffer to empty.
    pub fn take_chunk(&mut self) -> Bytes {
        let taken = std::mem::replace(&mut self.buffer, Buffer::with_capacity(self.config.chunk_budget));
        Bytes::from(taken.finish())
    }
}

/// Writes rows pulled from a plain synchronous [`Iterator`] into chunks,
/// without ever suspending (spec §4.9: "the former must not incur
/// per-row suspension").
pub struct SyncChunkEncoder<I> {
    rows: I,
    schema: RowSchema,
    encoder: StreamEncoder,
    header_written: bool,
    write_header: bool,
    exhausted: bool,
}

impl<I> SyncChunkEncoder<I>
where
    I: Iterator<Item = Vec<Value>>,
{
    pub fn new(rows: I, schema: RowSchema, config: StreamConfig, write_header: bool) -> Self {
        Self {
            rows,
            schema,
            encoder: StreamEncoder::new(config),
            header_written: false,
            write_header,
            exhausted: false,
        }
    }
}

impl<I> Iterator for SyncChunkEncoder<I>
where
    I: Iterator<Item = Vec<Value>>,
{
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.header_written {
            self.header_written = true;
            if self.write_header {
                self.encoder.write_header(&self.schema);
            }
        }
        loop {
            if self.encoder.should_yield() {
                return Some(Ok(self.encoder.take_chunk()));
            }
            match self.rows.next() {
                Some(row) => {
                    if let Err(e) = self.encoder.write_row(&self.schema, &row) {
                        return Some(Err(e));
                    }
                }
                None => {
                    if self.exhausted {
                        return None;
                    }
                    self.exhausted = true;
                    if !self.encoder.is_empty() {
                        return Some(Ok(self.encoder.take_chunk()));
                    }
                    return None;
                }
            }
        }
    }
}

/// Writes rows pulled from an asynchronous [`Stream`] into chunks. The
/// only suspension point is `rows.poll_next` (spec §5); encoding itself
/// never yields control back to the executor mid-row.
pub struct EncodeStream<S> {
    rows: S,
    schema: RowSchema,
    encoder: StreamEncoder,
    header_written: bool,
    write_header: bool,
    exhausted: bool,
}

impl<S> EncodeStream<S>
where
    S: Stream<Item = Vec<Value>> + Unpin,
{
    pub fn new(rows: S, schema: RowSchema, config: StreamConfig, write_header: bool) -> Self {
        Self {
            rows,
            schema,
            encoder: StreamEncoder::new(config),
            header_written: false,
            write_header,
            exhausted: false,
        }
    }
}

impl<S> Stream for EncodeStream<S>
where
    S: Stream<Item = Vec<Value>> + Unpin,
{
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if !this.header_written {
            this.header_written = true;
            if this.write_header {
                this.encoder.write_header(&this.schema);
            }
        }
        loop {
            if this.encoder.should_yield() {
                return Poll::Ready(Some(Ok(this.encoder.take_chunk())));
            }
            match Pin::new(&mut this.rows).poll_next(cx) {
                Poll::Ready(Some(row)) => {
                    if let Err(e) = this.encoder.write_row(&this.schema, &row) {
                        return Poll::Ready(Some(Err(e)));
                    }
                }
                Poll::Ready(None) => {
                    if this.exhausted {
                        return Poll::Ready(None);
                    }
                    this.exhausted = true;
                    if !this.encoder.is_empty() {
                        return Poll::Ready(Some(Ok(this.encoder.take_chunk())));
                    }
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
