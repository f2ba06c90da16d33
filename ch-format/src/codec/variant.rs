//! `Variant(T0, T1, ...)` (spec §4.5 "VariantCodec").
//!
//! One-byte discriminator: `0xFF` means null, otherwise it is an index
//! into the ordered type list. Encode requires the value to already carry
//! its discriminator (`Value::Variant { type_index, .. }`); there is no
//! implicit "which alternative does this value match" search — that
//! ambiguity is exactly what `Dynamic`'s type inference (§4.7) exists to
//! resolve for the *un-discriminated* case, which `Variant` is not.

use std::sync::Arc;

use ch_types::{Buffer, Cursor};

use super::Codec;
use crate::error::{Error, Result};
use crate::value::Value;

const NULL_DISCRIMINANT: u8 = 0xFF;

#[derive(Debug, Clone)]
pub struct VariantCodec {
    pub types: Vec<Arc<Codec>>,
}

impl VariantCodec {
    pub fn type_name(&self) -> String {
        let parts: Vec<String> = self.types.iter().map(|c| c.type_name()).collect();
        format!("Variant({})", parts.join(", "))
    }

    pub fn encode(&self, buf: &mut Buffer, value: &Value) -> Result<()> {
        match value {
            Value::Null => {
                buf.push(NULL_DISCRIMINANT);
                Ok(())
            }
            Value::Variant { type_index, value } => {
                let codec = self.types.get(*type_index as usize).ok_or_else(|| {
                    Error::malformed(self.type_name(), format!("discriminant {type_index} out of range"))
                })?;
                buf.push(*type_index);
                codec.encode(buf, value)
            }
            _ => Err(Error::malformed(
                self.type_name(),
                "expected a discriminated Variant value or null",
            )),
        }
    }

    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Value> {
        let tag = cursor.take_byte()?;
        if tag == NULL_DISCRIMINANT {
            return Ok(Value::Null);
        }
        let codec = self.types.get(tag as usize).ok_or_else(|| {
            Error::malformed(self.type_name(), format!("discriminant {tag} out of range"))
        })?;
        let value = codec.decode(cursor)?;
        Ok(Value::Variant {
            type_index: tag,
            value: Box::new(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ScalarKind;

    fn codec() -> VariantCodec {
        VariantCodec {
            types: vec![
                Arc::new(Codec::Scalar(ScalarKind::UInt64)),
                Arc::new(Codec::Scalar(ScalarKind::String)),
            ],
        }
    }

    #[test]
    fn round_trips_each_alternative() {
        let v = codec();
        let mut buf = Buffer::new();
        v.encode(
            &mut buf,
            &Value::Variant {
                type_index: 1,
                value: Box::new(Value::String("hi".into())),
            },
        )
        .unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        let decoded = v.decode(&mut cursor).unwrap();
        assert_eq!(
            decoded,
            Value::Variant {
                type_index: 1,
                value: Box::new(Value::String("hi".into()))
            }
        );
    }

    #[test]
    fn null_uses_0xff_discriminant() {
        let v = codec();
        let mut buf = Buffer::new();
        v.encode(&mut buf, &Value::Null).unwrap();
        assert_eq!(buf.finish(), vec![0xFF]);
    }
}
