//! Property-based and table-driven coverage for the streaming layer,
//! mirroring how `ch-types`/`ch-format` already use these same
//! dev-dependencies one layer down (spec §8 quantified invariants).

use std::sync::Arc;

use bytes::Bytes;
use quickcheck_macros::quickcheck;
use rstest::rstest;
use test_case::test_case;
use tokio_stream::wrappers::ReceiverStream;

use ch_wire::prelude::*;

fn uint32_schema() -> RowSchema {
    RowSchema::new(vec![(
        "v".to_string(),
        Arc::new(Codec::Scalar(ScalarKind::UInt32)),
    )])
}

async fn round_trip_over_split_points(rows: &[u32], split_points: &[usize]) -> Vec<Vec<Value>> {
    let schema = uint32_schema();
    let mut encoder = StreamEncoder::new(StreamConfig::default());
    for &v in rows {
        encoder.write_row(&schema, &[Value::UInt32(v)]).unwrap();
    }
    let whole = encoder.take_chunk();

    let mut chunks = Vec::new();
    let mut start = 0;
    for &split in split_points {
        let split = split.min(whole.len());
        if split > start {
            chunks.push(Bytes::copy_from_slice(&whole[start..split]));
            start = split;
        }
    }
    chunks.push(Bytes::copy_from_slice(&whole[start..]));

    let (tx, rx) = tokio::sync::mpsc::channel(chunks.len().max(1));
    for c in chunks {
        tx.send(Ok::<_, std::io::Error>(c)).await.unwrap();
    }
    drop(tx);

    let mut reader = StreamReader::new(ReceiverStream::new(rx));
    let mut collected = Vec::new();
    while let Some(batch) = reader.next_batch(&schema).await.unwrap() {
        collected.extend(batch);
    }
    collected
}

/// Spec §8 invariant 5, as a property: for arbitrary row sets and arbitrary
/// byte-offset split points, streamed batches concatenate to the same
/// sequence a non-streaming decode of the same bytes would produce.
#[quickcheck]
fn prop_batches_concatenate_to_original_order(rows: Vec<u32>, raw_splits: Vec<u16>) -> bool {
    let splits: Vec<usize> = raw_splits.into_iter().map(|s| s as usize).collect();
    let expected: Vec<Vec<Value>> = rows.iter().map(|&v| vec![Value::UInt32(v)]).collect();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let actual = rt.block_on(round_trip_over_split_points(&rows, &splits));
    actual == expected
}

/// Spec §8 "a chunk boundary falling in the middle of a LEB128 length
/// triggers exactly one pull" and the general mid-field-split case,
/// table-driven over where exactly the split lands within Scenario A's
/// bytes.
#[rstest]
#[case(1)] // inside the header's column-count varint region
#[case(10)] // inside a column name
#[case(23)] // inside the UInt64 row value
#[case(30)] // inside the trailing String row value
fn scenario_a_splits_cleanly_at_any_offset(#[case] split_at: usize) {
    let schema = RowSchema::new(vec![
        ("id".to_string(), Arc::new(Codec::Scalar(ScalarKind::UInt64))),
        ("name".to_string(), Arc::new(Codec::Scalar(ScalarKind::String))),
    ]);
    let mut encoder = StreamEncoder::new(StreamConfig::default());
    encoder.write_header(&schema);
    encoder
        .write_row(&schema, &[Value::UInt64(1), Value::String("Alice".to_string())])
        .unwrap();
    let whole = encoder.take_chunk();
    assert!(split_at < whole.len());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        let (tx, rx) = tokio::sync::mpsc::channel(2);
        tx.send(Ok::<_, std::io::Error>(Bytes::copy_from_slice(&whole[..split_at])))
            .await
            .unwrap();
        tx.send(Ok::<_, std::io::Error>(Bytes::copy_from_slice(&whole[split_at..])))
            .await
            .unwrap();
        drop(tx);

        let mut reader = StreamReader::new(ReceiverStream::new(rx));
        let registry = CodecRegistry::new();
        let decoded_schema = reader.read_header(&registry).await.unwrap();
        let batch = reader.next_batch(&decoded_schema).await.unwrap().expect("one batch");
        assert_eq!(batch, vec![vec![Value::UInt64(1), Value::String("Alice".to_string())]]);
    });
}

/// Spec §8 LEB128 boundary byte widths (0, 127, 128, 16383, 16384 use 1,
/// 1, 2, 2, 3 bytes), driven through the encoder's header column-count
/// field rather than `ch_types::varint` directly, since that invariant is
/// already covered there — this exercises the same boundary through the
/// public streaming surface.
#[test_case(0, 1)]
#[test_case(127, 1)]
#[test_case(128, 2)]
#[test_case(16383, 2)]
#[test_case(16384, 3)]
fn header_column_count_varint_width(count: u32, expected_bytes: usize) {
    let columns: Vec<(String, Arc<Codec>)> = (0..count)
        .map(|i| (format!("c{i}"), Arc::new(Codec::Scalar(ScalarKind::UInt8))))
        .collect();
    let schema = RowSchema::new(columns);
    let mut encoder = StreamEncoder::new(StreamConfig::default());
    encoder.write_header(&schema);
    let bytes = encoder.take_chunk();
    assert_eq!(ch_types::varint::varint_size(count as u64), expected_bytes);

    let mut cursor = ch_types::Cursor::new(&bytes);
    let decoded_count = ch_types::varint::read_varint(&mut cursor).unwrap();
    assert_eq!(decoded_count, count as u64);
    assert_eq!(cursor.offset(), expected_bytes);
}
