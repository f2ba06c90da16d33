//! Codec registry and dispatch (spec §4.3, §5 "Shared resources").
//!
//! A process-wide, write-once-per-key cache from textual type to codec
//! instance. The first lookup of a new type builds and inserts a codec;
//! every subsequent lookup of the same string returns the identical
//! `Arc`. Construction recurses through the same registry for child
//! types, so two syntactically identical nested types share one codec
//! subtree rather than each owning a private copy.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::codec::{
    Codec, DateTime64Codec, DecimalCodec, DecimalWidth, EnumCodec, EnumWidth, ScalarKind,
    TupleShape, VariantCodec,
};
use crate::error::{Error, Result};
use crate::grammar::{self, TupleElement};

/// The process-wide codec cache described in §5: "the first lookup of a
/// new type constructs and inserts a codec; subsequent lookups return
/// the same instance." A single [`Mutex`] around a [`HashMap`] is
/// sufficient here — construction is cheap enough that lock contention
/// during the cache-miss path is never a bottleneck in practice, and the
/// lock is never held while recursing into child lookups.
#[derive(Default)]
pub struct CodecRegistry {
    cache: Mutex<HashMap<String, Arc<Codec>>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the codec for `type_name`, building and caching it on
    /// first reference.
    pub fn get(&self, type_name: &str) -> Result<Arc<Codec>> {
        if let Some(hit) = self.cache.lock().expect("registry mutex poisoned").get(type_name) {
            return Ok(Arc::clone(hit));
        }
        tracing::trace!(type_name, "building codec");
        let built = Arc::new(self.build(type_name)?);
        let mut guard = self.cache.lock().expect("registry mutex poisoned");
        // Another thread may have raced us to this key; keep whichever
        // codec landed first so `get` never hands out two instances for
        // the same string in one process lifetime (§3 Invariants).
        let entry = guard
            .entry(type_name.to_string())
            .or_insert_with(|| built);
        Ok(Arc::clone(entry))
    }

    /// Parses and caches every type in `types` up front — useful for a
    /// session that already knows its full column schema before decoding
    /// the first row (§4.3 ambient supplement item 7).
    pub fn prewarm<'a, I: IntoIterator<Item = &'a str>>(&self, types: I) -> Result<()> {
        for type_name in types {
            self.get(type_name)?;
        }
        Ok(())
    }

    fn build(&self, type_name: &str) -> Result<Codec> {
        let node = grammar::parse_type(type_name)?;

        // 1. Zero-argument scalars.
        if node.args.is_empty() {
            if let Some(kind) = ScalarKind::from_name(&node.name) {
                return Ok(Codec::Scalar(kind));
            }
        }

        match node.name.as_str() {
            // 2. Nullable(T)
            "Nullable" => {
                let inner = self.one_arg(type_name, &node.args)?;
                Ok(Codec::Nullable(self.get(inner)?))
            }
            // 3. LowCardinality(T) — transparent; RowBinary carries no
            // dictionary, so the cached codec is simply T's.
            "LowCardinality" => {
                let inner = self.one_arg(type_name, &node.args)?;
                Ok((*self.get(inner)?).clone())
            }
            // 4. Array(T)
            "Array" => {
                let inner = self.one_arg(type_name, &node.args)?;
                Ok(Codec::Array(self.get(inner)?))
            }
            // 5. Nested(fields...) -> Array(Tuple(fields...))
            "Nested" => {
                let rewritten = format!("Array(Tuple({}))", node.args.join(", "));
                self.build(&rewritten)
            }
            // 6. Map(K, V)
            "Map" => {
                if node.args.len() != 2 {
                    return Err(Error::malformed(type_name, "Map requires two type arguments"));
                }
                Ok(Codec::Map {
                    key: self.get(&node.args[0])?,
                    value: self.get(&node.args[1])?,
                })
            }
            // 7. Tuple(elements...)
            "Tuple" => self.build_tuple(type_name, &node.args),
            // 8. FixedString(N)
            "FixedString" => {
                let n = parse_usize(type_name, node.args.first())?;
                Ok(Codec::FixedString(n))
            }
            // 9. DateTime64(p[, tz])
            "DateTime64" => {
                let precision: u8 = node
                    .args
                    .first()
                    .ok_or_else(|| Error::malformed(type_name, "DateTime64 requires a precision"))?
                    .parse()
                    .map_err(|_| Error::malformed(type_name, "precision is not numeric"))?;
                Ok(Codec::DateTime64(DateTime64Codec { precision }))
            }
            // 10. Decimal-prefixed
            name if name.starts_with("Decimal") => self.build_decimal(type_name, name, &node.args),
            // 11. Enum8 / Enum16
            "Enum8" | "Enum16" => self.build_enum(type_name, &node),
            // 12. JSON / Object('json')
            "JSON" => Ok(Codec::Json),
            "Object" => {
                let is_json_alias = node
                    .args
                    .first()
                    .map(|a| a.trim_matches('\'') == "json")
                    .unwrap_or(false);
                if is_json_alias {
                    Ok(Codec::Json)
                } else {
                    Err(Error::unsupported(type_name))
                }
            }
            // 13. Dynamic
            "Dynamic" => Ok(Codec::Dynamic),
            // 14. Variant(...)
            "Variant" => {
                let mut types = Vec::with_capacity(node.args.len());
                for arg in &node.args {
                    types.push(self.get(arg)?);
                }
                Ok(Codec::Variant(VariantCodec { types }))
            }
            // 15. Geo aliases — rewritten to their expansion and re-dispatched.
            "Point" => self.build("Tuple(Float64, Float64)"),
            "Ring" => self.build("Array(Point)"),
            "Polygon" => self.build("Array(Ring)"),
            "MultiPolygon" => self.build("Array(Polygon)"),
            _ => Err(Error::unsupported(type_name)),
        }
    }

    fn one_arg<'a>(&self, type_name: &str, args: &'a [String]) -> Result<&'a str> {
        args.first()
            .map(String::as_str)
            .ok_or_else(|| Error::malformed(type_name, "expected exactly one type argument"))
    }

    fn build_tuple(&self, type_name: &str, args: &[String]) -> Result<Codec> {
        if args.is_empty() {
            return Err(Error::malformed(type_name, "Tuple requires at least one element"));
        }
        let elements: Vec<TupleElement> = args
            .iter()
            .map(|raw| grammar::classify_tuple_element(raw))
            .collect();
        let all_named = elements.iter().all(|e| matches!(e, TupleElement::Named(..)));
        let all_positional = elements
            .iter()
            .all(|e| matches!(e, TupleElement::Positional(_)));
        if !all_named && !all_positional {
            return Err(Error::malformed(
                type_name,
                "tuple elements must be either fully named or fully positional",
            ));
        }
        if all_named {
            let mut map = IndexMap::with_capacity(elements.len());
            for e in elements {
                if let TupleElement::Named(name, ty) = e {
                    let codec = self.get(&ty)?;
                    map.insert(name, codec);
                }
            }
            Ok(Codec::Tuple(TupleShape::Named(map)))
        } else {
            let mut elems = Vec::with_capacity(elements.len());
            for e in elements {
                if let TupleElement::Positional(ty) = e {
                    elems.push(self.get(&ty)?);
                }
            }
            Ok(Codec::Tuple(TupleShape::Positional(elems)))
        }
    }

    fn build_decimal(&self, type_name: &str, name: &str, args: &[String]) -> Result<Codec> {
        let (precision, scale) = match name {
            "Decimal" => {
                if args.len() != 2 {
                    return Err(Error::malformed(type_name, "Decimal requires (precision, scale)"));
                }
                let precision = parse_u32(type_name, &args[0])?;
                let scale = parse_u32(type_name, &args[1])?;
                (precision, scale)
            }
            "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
                let width = width_for_family(name);
                let default_precision = crate::codec::type_descriptor::default_precision(width);
                let scale = args
                    .first()
                    .map(|a| parse_u32(type_name, a))
                    .transpose()?
                    .unwrap_or(0);
                (default_precision, scale)
            }
            _ => return Err(Error::unsupported(type_name)),
        };
        let width = if name == "Decimal" {
            DecimalWidth::from_precision(precision)
        } else {
            width_for_family(name)
        };
        Ok(Codec::Decimal(DecimalCodec {
            precision,
            scale,
            width,
        }))
    }

    fn build_enum(&self, type_name: &str, node: &grammar::TypeNode) -> Result<Codec> {
        let width = if node.name == "Enum8" {
            EnumWidth::Eight
        } else {
            EnumWidth::Sixteen
        };
        let mut names = IndexMap::with_capacity(node.args.len());
        for raw in &node.args {
            let (name, value) = raw
                .split_once('=')
                .ok_or_else(|| Error::malformed(type_name, "expected 'name' = value"))?;
            let name = name.trim().trim_matches('\'').to_string();
            let value: i16 = value
                .trim()
                .parse()
                .map_err(|_| Error::malformed(type_name, "non-numeric enum tag"))?;
            names.insert(value, name);
        }
        Ok(Codec::Enum(EnumCodec { width, names }))
    }
}

fn width_for_family(name: &str) -> DecimalWidth {
    match name {
        "Decimal32" => DecimalWidth::W4,
        "Decimal64" => DecimalWidth::W8,
        "Decimal128" => DecimalWidth::W16,
        _ => DecimalWidth::W32,
    }
}

fn parse_usize(type_name: &str, arg: Option<&String>) -> Result<usize> {
    arg.ok_or_else(|| Error::malformed(type_name, "missing numeric argument"))?
        .parse()
        .map_err(|_| Error::malformed(type_name, "argument is not numeric"))
}

fn parse_u32(type_name: &str, arg: &str) -> Result<u32> {
    arg.trim()
        .parse()
        .map_err(|_| Error::malformed(type_name, "argument is not numeric"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_identical_instance() {
        let registry = CodecRegistry::new();
        let a = registry.get("Array(UInt64)").unwrap();
        let b = registry.get("Array(UInt64)").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn prewarm_populates_cache_for_every_type() {
        let registry = CodecRegistry::new();
        registry
            .prewarm(["UInt64", "String", "Array(UInt16)"])
            .unwrap();
        let warmed = registry.get("Array(UInt16)").unwrap();
        let looked_up = registry.get("Array(UInt16)").unwrap();
        assert!(Arc::ptr_eq(&warmed, &looked_up));
    }

    #[test]
    fn low_cardinality_is_transparent() {
        let registry = CodecRegistry::new();
        let plain = registry.get("String").unwrap();
        let wrapped = registry.get("LowCardinality(String)").unwrap();
        assert_eq!(plain.type_name(), wrapped.type_name());
    }

    #[test]
    fn nested_rewrites_to_array_of_tuple() {
        let registry = CodecRegistry::new();
        let codec = registry.get("Nested(a UInt8, b String)").unwrap();
        assert_eq!(codec.type_name(), "Array(Tuple(a UInt8, b String))");
    }

    #[test]
    fn geo_aliases_expand() {
        let registry = CodecRegistry::new();
        assert_eq!(
            registry.get("Point").unwrap().type_name(),
            "Tuple(Float64, Float64)"
        );
        assert_eq!(
            registry.get("Ring").unwrap().type_name(),
            "Array(Tuple(Float64, Float64))"
        );
    }

    #[test]
    fn named_and_positional_tuple() {
        let registry = CodecRegistry::new();
        let positional = registry.get("Tuple(Int64, String)").unwrap();
        assert_eq!(positional.type_name(), "Tuple(Int64, String)");
        let named = registry.get("Tuple(a Int64, b String)").unwrap();
        assert_eq!(named.type_name(), "Tuple(a Int64, b String)");
    }

    #[test]
    fn mixed_tuple_is_rejected() {
        let registry = CodecRegistry::new();
        assert!(registry.get("Tuple(a Int64, String)").is_err());
    }

    #[test]
    fn decimal_prefix_dispatch() {
        let registry = CodecRegistry::new();
        let codec = registry.get("Decimal(18, 4)").unwrap();
        assert_eq!(codec.type_name(), "Decimal64(18, 4)");
    }

    #[test]
    fn enum8_tracks_name_table() {
        let registry = CodecRegistry::new();
        let codec = registry.get("Enum8('a' = 1, 'b' = 2)").unwrap();
        match &*codec {
            Codec::Enum(e) => assert_eq!(e.name_for(1), Some("a")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn object_json_alias() {
        let registry = CodecRegistry::new();
        let codec = registry.get("Object('json')").unwrap();
        assert_eq!(codec.type_name(), "JSON");
    }

    #[test]
    fn unrecognized_type_is_unsupported() {
        let registry = CodecRegistry::new();
        let err = registry.get("NotARealType").unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }
}
