//! End-to-end tests driving the encoder and reader together over the
//! public `ch_wire` surface (spec §8 scenarios, exercised through the
//! actual streaming API rather than the per-codec unit tests already
//! covered inside `ch-format`).

use std::sync::Arc;

use bytes::Bytes;
use tokio_stream::wrappers::ReceiverStream;

use ch_wire::prelude::*;

fn id_name_schema() -> RowSchema {
    RowSchema::new(vec![
        ("id".to_string(), Arc::new(Codec::Scalar(ScalarKind::UInt64))),
        ("name".to_string(), Arc::new(Codec::Scalar(ScalarKind::String))),
    ])
}

/// Spec §8 Scenario A, round-tripped through the encoder and then the
/// reader, rather than asserted against a literal byte array.
#[tokio::test]
async fn round_trips_single_row_with_header() {
    let schema = id_name_schema();
    let rows = vec![vec![Value::UInt64(1), Value::String("Alice".to_string())]];

    let mut encoded = SyncChunkEncoder::new(rows.into_iter(), schema.clone(), StreamConfig::default(), true)
        .map(|c| c.unwrap())
        .collect::<Vec<_>>();
    assert_eq!(encoded.len(), 1);
    let bytes = encoded.pop().unwrap();

    let (tx, rx) = tokio::sync::mpsc::channel(1);
    tx.send(Ok::<_, std::io::Error>(bytes)).await.unwrap();
    drop(tx);
    let mut reader = StreamReader::new(ReceiverStream::new(rx));
    let registry = CodecRegistry::new();
    let decoded_schema = reader.read_header(&registry).await.unwrap();
    assert_eq!(decoded_schema.names().collect::<Vec<_>>(), vec!["id", "name"]);

    let batch = reader.next_batch(&decoded_schema).await.unwrap().expect("one batch");
    assert_eq!(batch, vec![vec![Value::UInt64(1), Value::String("Alice".to_string())]]);
    assert!(reader.next_batch(&decoded_schema).await.unwrap().is_none());
}

/// Drives the whole pipeline through chunks as small as a single byte,
/// forcing the reader to pull repeatedly and exercise the retry loop on
/// virtually every field (a stress variant of spec §8 Scenario E).
#[tokio::test]
async fn round_trips_many_rows_over_byte_sized_chunks() {
    let schema = id_name_schema();
    let rows: Vec<Vec<Value>> = (0..50u64)
        .map(|i| vec![Value::UInt64(i), Value::String(format!("row-{i}"))])
        .collect();

    let mut encoder = StreamEncoder::new(StreamConfig::default());
    encoder.write_header(&schema);
    for row in &rows {
        encoder.write_row(&schema, row).unwrap();
    }
    let whole = encoder.take_chunk();

    let (tx, rx) = tokio::sync::mpsc::channel(whole.len() + 1);
    for byte in whole.iter() {
        tx.send(Ok::<_, std::io::Error>(Bytes::copy_from_slice(&[*byte]))).await.unwrap();
    }
    drop(tx);

    let mut reader = StreamReader::new(ReceiverStream::new(rx));
    let registry = CodecRegistry::new();
    let decoded_schema = reader.read_header(&registry).await.unwrap();

    let mut collected = Vec::new();
    while let Some(batch) = reader.next_batch(&decoded_schema).await.unwrap() {
        collected.extend(batch);
    }
    assert_eq!(collected, rows);
}

/// Spec §8 invariant 5: batches concatenate back to the same row sequence
/// a non-streaming decode would produce, regardless of how chunks split.
#[tokio::test]
async fn batch_concatenation_matches_non_streaming_order() {
    let schema = RowSchema::new(vec![(
        "v".to_string(),
        Arc::new(Codec::Scalar(ScalarKind::UInt32)),
    )]);
    let rows: Vec<Vec<Value>> = (0..20u32).map(|i| vec![Value::UInt32(i)]).collect();

    let mut encoder = StreamEncoder::new(StreamConfig::default());
    for row in &rows {
        encoder.write_row(&schema, row).unwrap();
    }
    let whole = encoder.take_chunk();

    // Split into three uneven chunks.
    let a = whole.len() / 5;
    let b = whole.len() / 2;
    let chunks = vec![
        Bytes::copy_from_slice(&whole[..a]),
        Bytes::copy_from_slice(&whole[a..b]),
        Bytes::copy_from_slice(&whole[b..]),
    ];

    let (tx, rx) = tokio::sync::mpsc::channel(chunks.len());
    for c in chunks {
        tx.send(Ok::<_, std::io::Error>(c)).await.unwrap();
    }
    drop(tx);

    let mut reader = StreamReader::new(ReceiverStream::new(rx));
    let mut collected = Vec::new();
    while let Some(batch) = reader.next_batch(&schema).await.unwrap() {
        collected.extend(batch);
    }
    assert_eq!(collected, rows);
}

/// A mid-row truncation with no more chunks coming is a fatal
/// `UnexpectedEof`, not a silently empty result (spec §4.8, §7).
#[tokio::test]
async fn truncated_row_is_unexpected_eof() {
    let schema = RowSchema::new(vec![(
        "v".to_string(),
        Arc::new(Codec::Scalar(ScalarKind::UInt64)),
    )]);
    let (tx, rx) = tokio::sync::mpsc::channel(1);
    tx.send(Ok::<_, std::io::Error>(Bytes::copy_from_slice(&[1, 2, 3])))
        .await
        .unwrap();
    drop(tx);
    let mut reader = StreamReader::new(ReceiverStream::new(rx));
    let err = reader.next_batch(&schema).await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedEof { .. }));
}
