//! `RowBinaryWithNamesAndTypes` framing (spec §6).
//!
//! ```text
//! LEB128  column_count
//! column_count × String   column_names
//! column_count × String   column_types
//! (column_count × column_codec_encoded_value) repeated for each row until EOF
//! ```
//!
//! Bare `RowBinary` is just the row repetition with no preamble at all —
//! a caller that already knows its schema can skip [`StreamReader::read_header`]
//! (`crate::reader`) / [`StreamEncoder::write_header`] (`crate::encoder`)
//! entirely and decode/encode rows directly against a [`RowSchema`] it
//! built itself.

use std::sync::Arc;

use ch_format::Codec;

/// A resolved column list: declared name paired with its codec, in
/// on-the-wire column order. This is the schema both [`crate::reader`]
/// and [`crate::encoder`] decode/encode rows against.
#[derive(Debug, Clone)]
pub struct RowSchema {
    columns: Vec<(String, Arc<Codec>)>,
}

impl RowSchema {
    pub fn new(columns: Vec<(String, Arc<Codec>)>) -> Self {
        Self { columns }
    }

    /// The `(name, codec)` pairs in declared column order.
    pub fn columns(&self) -> &[(String, Arc<Codec>)] {
        &self.columns
    }

    /// Just the codecs, in column order — the hot path for row decode.
    pub fn codecs(&self) -> impl Iterator<Item = &Arc<Codec>> {
        self.columns.iter().map(|(_, c)| c)
    }

    /// Just the declared names, in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ch_format::ScalarKind;

    #[test]
    fn exposes_names_and_codecs_in_order() {
        let schema = RowSchema::new(vec![
            ("id".into(), Arc::new(Codec::Scalar(ScalarKind::UInt64))),
            ("name".into(), Arc::new(Codec::Scalar(ScalarKind::String))),
        ]);
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["id", "name"]);
        assert_eq!(schema.codecs().count(), 2);
    }
}
