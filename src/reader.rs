//! The streaming frame reader (spec §4.8).
//!
//! A single-consumer, pull-based byte accumulator that lets the
//! synchronous codecs in [`ch_format`] run over an asynchronously
//! arriving sequence of byte chunks. The reader suspends at exactly one
//! point — awaiting the next chunk from its [`tokio_stream::Stream`]
//! source — and is otherwise a plain synchronous retry loop (§5
//! "Scheduling").

use std::sync::Arc;

use bytes::Bytes;
use ch_format::{Codec, CodecRegistry, Value};
use ch_types::{string, varint, Cursor, DecodeOptions};
use tokio_stream::{Stream, StreamExt};

use crate::error::{Error, Result};
use crate::frame::RowSchema;

/// A decoded row: one [`Value`] per column, in declared column order.
pub type Row = Vec<Value>;

/// Pull-based accumulator over an asynchronous byte-chunk source.
///
/// Invariant (spec §3 "Streaming state"): bytes in `[offset, len)` are
/// valid unread bytes. Every growth reallocates a fresh buffer rather
/// than compacting the existing one in place (spec §5 "Buffer aliasing
/// invariant") — this crate's [`Value`] is always owned, so nothing
/// aliases the old buffer today, but a future zero-copy consumer built on
/// top of [`StreamReader::unread`] could hold a borrow across a single
/// `pull_more`, and this discipline keeps that safe without having to
/// revisit this module later.
pub struct StreamReader<S> {
    source: S,
    buffer: Vec<u8>,
    offset: usize,
    source_exhausted: bool,
    options: DecodeOptions,
    initial_capacity: usize,
}

impl<S> StreamReader<S>
where
    S: Stream<Item = std::io::Result<Bytes>> + Unpin,
{
    /// Wraps `source` with default decode options and the default
    /// [`crate::config::StreamConfig`] initial capacity.
    pub fn new(source: S) -> Self {
        Self::with_options(source, DecodeOptions::default(), 8 * 1024)
    }

    /// Wraps `source` with explicit decode options and initial capacity
    /// (spec §6 "Configuration options", §4.8 `pullMore`).
    pub fn with_options(source: S, options: DecodeOptions, initial_capacity: usize) -> Self {
        Self {
            source,
            buffer: Vec::with_capacity(initial_capacity),
            offset: 0,
            source_exhausted: false,
            options,
            initial_capacity,
        }
    }

    /// The current unread contiguous view (§4.8 `getSlice()`).
    pub fn unread(&self) -> &[u8] {
        &self.buffer[self.offset..]
    }

    /// Advances the offset forward after a successful synchronous decode
    /// consumed `n` bytes (§4.8 `advance(n)`).
    pub fn advance(&mut self, n: usize) {
        self.offset += n;
        debug_assert!(self.offset <= self.buffer.len());
    }

    /// True once the source has signaled end-of-stream and every pulled
    /// byte has been consumed.
    pub fn is_drained(&self) -> bool {
        self.source_exhausted && self.offset == self.buffer.len()
    }

    /// Awaits the next chunk and appends it, reallocating fresh when the
    /// unread tail plus the new chunk needs room (§4.8 `pullMore()`).
    async fn pull_more(&mut self) -> Result<()> {
        match self.source.next().await {
            Some(Ok(chunk)) => {
                tracing::trace!(len = chunk.len(), "pulled chunk");
                self.append(&chunk);
                Ok(())
            }
            Some(Err(e)) => Err(Error::Header {
                reason: format!("byte source failed: {e}"),
            }),
            None => {
                tracing::trace!("byte source exhausted");
                self.source_exhausted = true;
                Ok(())
            }
        }
    }

    /// Loops `pull_more` until at least `need` bytes are available or the
    /// source is exhausted (§4.8 `ensure(n)`).
    pub async fn ensure(&mut self, need: usize) -> Result<()> {
        while self.unread().len() < need && !self.source_exhausted {
            self.pull_more().await?;
        }
        Ok(())
    }

    fn append(&mut self, chunk: &[u8]) {
        let unread_len = self.buffer.len() - self.offset;
        let needed = unread_len + chunk.len();
        let new_capacity = (self.buffer.capacity().max(self.initial_capacity) * 2).max(needed);
        let mut fresh = Vec::with_capacity(new_capacity);
        fresh.extend_from_slice(&self.buffer[self.offset..]);
        fresh.extend_from_slice(chunk);
        self.buffer = fresh;
        self.offset = 0;
    }

    /// Runs `decode` against a cursor over the current unread slice,
    /// retrying with fresh pulls on underflow (the central control flow
    /// of §4.8: "Retry-on-underflow pattern"). `decode` must not partially
    /// advance any state visible outside its own return value — on
    /// success the reader advances past exactly the bytes `decode`
    /// consumed; on underflow the attempt is discarded entirely and
    /// retried from the same starting offset once more bytes arrive.
    async fn retry_on_underflow<T>(
        &mut self,
        context: &'static str,
        mut decode: impl FnMut(&mut Cursor<'_>) -> ch_format::Result<T>,
    ) -> Result<T> {
        loop {
            let start = self.offset;
            let mut cursor = Cursor::with_options(&self.buffer[self.offset..], self.options);
            match decode(&mut cursor) {
                Ok(value) => {
                    let consumed = cursor.offset();
                    self.offset += consumed;
                    return Ok(value);
                }
                Err(e) if e.is_underflow() => {
                    if self.source_exhausted {
                        return Err(Error::UnexpectedEof { context, offset: start });
                    }
                    self.pull_more().await?;
                }
                Err(e) => return Err(Error::Codec(e)),
            }
        }
    }

    /// Reads the `RowBinaryWithNamesAndTypes` preamble: column count,
    /// then that many names, then that many types, resolving each type
    /// through `registry` (spec §6 "RowBinaryWithNamesAndTypes frame").
    /// Each field uses the same retry loop as row decoding — "names and
    /// types each use a per-string retry helper" (§4.8).
    pub async fn read_header(&mut self, registry: &CodecRegistry) -> Result<RowSchema> {
        let count = self
            .retry_on_underflow("header column count", |c| {
                varint::read_varint(c).map_err(ch_format::Error::from)
            })
            .await? as usize;

        let mut names = Vec::with_capacity(count);
        for _ in 0..count {
            let name = self
                .retry_on_underflow("header column name", |c| {
                    string::read_str(c).map(str::to_owned).map_err(ch_format::Error::from)
                })
                .await?;
            names.push(name);
        }

        let mut columns = Vec::with_capacity(count);
        for name in names {
            let type_name = self
                .retry_on_underflow("header column type", |c| {
                    string::read_str(c).map(str::to_owned).map_err(ch_format::Error::from)
                })
                .await?;
            let codec = registry.get(&type_name).map_err(Error::Codec)?;
            columns.push((name, codec));
        }
        Ok(RowSchema::new(columns))
    }

    /// Decodes one row against `schema`, retrying on underflow.
    async fn read_row(&mut self, schema: &RowSchema) -> Result<Row> {
        self.retry_on_underflow("row", |cursor| {
            let mut values = Vec::with_capacity(schema.columns().len());
            for codec in schema.codecs() {
                values.push(codec.decode(cursor)?);
            }
            Ok(values)
        })
        .await
    }

    /// Decodes as many complete rows as the current unread slice permits,
    /// returning them as one batch, then starts a new batch on the next
    /// call (spec §4.8 "Batch yielding policy"). Returns `None` once the
    /// source is exhausted exactly at a row boundary (normal
    /// termination); an exhausted source mid-row surfaces as
    /// [`Error::UnexpectedEof`] from the underlying `read_row` call.
    ///
    /// When underflow strikes mid-row, any complete rows already decoded
    /// into the batch are returned immediately *without* pulling further
    /// — the caller gets them right away, and the next call resumes by
    /// pulling until the partial row completes (§4.8: "any already-decoded
    /// complete rows in the current batch are yielded first").
    pub async fn next_batch(&mut self, schema: &RowSchema) -> Result<Option<Vec<Row>>> {
        if self.is_drained() {
            return Ok(None);
        }
        let mut batch = Vec::new();
        loop {
            match self.try_read_row_no_pull(schema) {
                Some(Ok(row)) => batch.push(row),
                Some(Err(e)) if e.is_underflow() => {
                    if batch.is_empty() {
                        // No complete rows yet this round; finish the
                        // partial row via the pulling path before
                        // yielding anything (§4.8: "pulls continue to
                        // finish the partial row").
                        let row = self.read_row(schema).await?;
                        batch.push(row);
                    }
                    break;
                }
                Some(Err(e)) => return Err(Error::Codec(e)),
                None if self.source_exhausted => break,
                None if batch.is_empty() => {
                    // Nothing decoded yet and no bytes at all right now —
                    // pull once to find out whether the stream has more.
                    self.pull_more().await?;
                }
                None => break,
            }
        }
        if batch.is_empty() {
            return Ok(None);
        }
        Ok(Some(batch))
    }

    /// Tries to decode one row from the current unread slice without
    /// pulling more bytes — used by `next_batch` to detect "the current
    /// chunk's worth of rows is exhausted" without eagerly reaching for
    /// the network.
    fn try_read_row_no_pull(&mut self, schema: &RowSchema) -> Option<ch_format::Result<Row>> {
        if self.offset == self.buffer.len() {
            return None;
        }
        let consumed;
        let mut values = Vec::with_capacity(schema.columns().len());
        {
            let mut cursor = Cursor::with_options(&self.buffer[self.offset..], self.options);
            for codec in schema.codecs() {
                match codec.decode(&mut cursor) {
                    Ok(v) => values.push(v),
                    Err(e) => return Some(Err(e)),
                }
            }
            consumed = cursor.offset();
        }
        self.offset += consumed;
        Some(Ok(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch_format::ScalarKind;
    use std::sync::Arc as StdArc;
    use tokio_stream::wrappers::ReceiverStream;

    fn chunks_of(bytes: &[u8], splits: &[usize]) -> Vec<std::io::Result<Bytes>> {
        let mut out = Vec::new();
        let mut start = 0;
        for &split in splits {
            out.push(Ok(Bytes::copy_from_slice(&bytes[start..split])));
            start = split;
        }
        out.push(Ok(Bytes::copy_from_slice(&bytes[start..])));
        out
    }

    /// Spec §8 Scenario E: a chunk boundary falling mid-row triggers
    /// exactly one pull and resume is transparent.
    #[tokio::test]
    async fn scenario_e_streaming_split_mid_row() {
        let header_and_row: Vec<u8> = vec![
            0x02, 0x02, b'i', b'd', 0x04, b'n', b'a', b'm', b'e', 0x06, b'U', b'I', b'n', b't',
            b'6', b'4', 0x06, b'S', b't', b'r', b'i', b'n', b'g', 0x01, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x05, b'A', b'l', b'i', b'c', b'e',
        ];
        let split_at = header_and_row.len() - 9; // splits inside the u64
        let chunks = chunks_of(&header_and_row, &[split_at]);
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        for c in chunks {
            tx.send(c).await.unwrap();
        }
        drop(tx);
        let mut reader = StreamReader::new(ReceiverStream::new(rx));
        let registry = CodecRegistry::new();
        let schema = reader.read_header(&registry).await.unwrap();
        assert_eq!(schema.columns()[0].0, "id");
        assert_eq!(schema.columns()[1].0, "name");

        let batch = reader.next_batch(&schema).await.unwrap().expect("one batch");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0][0], Value::UInt64(1));
        assert_eq!(batch[0][1], Value::String("Alice".to_string()));

        assert!(reader.next_batch(&schema).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn multiple_rows_in_one_chunk_form_one_batch() {
        let mut bytes = Vec::new();
        // UInt8 column, two rows: 1, 2.
        bytes.push(1u8);
        bytes.push(2u8);
        let (tx, rx) = tokio::sync::mpsc::channel(4);
        tx.send(Ok(Bytes::copy_from_slice(&bytes))).await.unwrap();
        drop(tx);
        let mut reader = StreamReader::new(ReceiverStream::new(rx));
        let schema = RowSchema::new(vec![(
            "v".to_string(),
            StdArc::new(Codec::Scalar(ScalarKind::UInt8)),
        )]);
        let batch = reader.next_batch(&schema).await.unwrap().expect("one batch");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0][0], Value::UInt8(1));
        assert_eq!(batch[1][0], Value::UInt8(2));
        assert!(reader.next_batch(&schema).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_stream_after_header_yields_no_batches() {
        let registry = CodecRegistry::new();
        let header: Vec<u8> = vec![0x01, 0x01, b'v', 0x05, b'U', b'I', b'n', b't', b'8'];
        let (tx, rx) = tokio::sync::mpsc::channel(2);
        tx.send(Ok(Bytes::copy_from_slice(&header))).await.unwrap();
        drop(tx);
        let mut reader = StreamReader::new(ReceiverStream::new(rx));
        let schema = reader.read_header(&registry).await.unwrap();
        assert!(reader.next_batch(&schema).await.unwrap().is_none());
    }
}
