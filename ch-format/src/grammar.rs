//! Textual type grammar (spec §4.2).
//!
//! ```text
//! type    := ident | ident '(' args ')'
//! args    := type { ',' type } | named { ',' named }
//! named   := ident WS type
//! ident   := [A-Za-z_][A-Za-z0-9_]*
//! ```
//!
//! Parsing is a depth-counted split, not a recursive-descent grammar with
//! a token stream: a type's argument list is scanned once to find its
//! top-level comma positions (honoring nested parentheses and quoted
//! strings), and the resulting substrings are handed back as raw text for
//! each codec constructor to interpret on its own terms (a plain nested
//! type, a number, a named-tuple element, ...). This mirrors the source's
//! "scan tracking depth, split on commas at depth zero" description
//! exactly and avoids building an intermediate token stream no consumer
//! needs.

use crate::error::{Error, Result};

/// A parsed type descriptor: its head identifier and raw argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNode {
    /// The head identifier, e.g. `"Array"`, `"UInt64"`, `"Decimal"`.
    pub name: String,
    /// Raw, trimmed argument substrings, split at top-level commas.
    /// Empty when the type takes no parentheses at all (`args` stays
    /// empty, not `[""]`).
    pub args: Vec<String>,
}

/// Parses one type descriptor, e.g. `"Map(String, Array(UInt8))"`.
pub fn parse_type(input: &str) -> Result<TypeNode> {
    let input = input.trim();
    match input.find('(') {
        None => {
            validate_ident(input)?;
            Ok(TypeNode {
                name: input.to_string(),
                args: Vec::new(),
            })
        }
        Some(open) => {
            if !input.ends_with(')') {
                return Err(Error::malformed(input, "unbalanced parentheses"));
            }
            let name = input[..open].trim();
            validate_ident(name)?;
            let body = &input[open + 1..input.len() - 1];
            let args = split_top_level(body)?
                .into_iter()
                .map(|s| s.trim().to_string())
                .collect();
            Ok(TypeNode {
                name: name.to_string(),
                args,
            })
        }
    }
}

fn validate_ident(s: &str) -> Result<()> {
    let mut chars = s.chars();
    let ok = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::malformed(s, "not a valid type identifier"))
    }
}

/// Splits `body` on commas at parenthesis depth zero, honoring `'...'`
/// quoted segments (used by `DateTime64(3, 'UTC')` and `Enum8('a' = 1)`
/// parameter lists, where a comma or paren could otherwise appear inside
/// a quoted literal).
pub fn split_top_level(body: &str) -> Result<Vec<&str>> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut in_quote = false;
    let mut start = 0usize;
    let bytes = body.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quote = !in_quote,
            b'(' if !in_quote => depth += 1,
            b')' if !in_quote => {
                depth -= 1;
                if depth < 0 {
                    return Err(Error::malformed(body, "unbalanced parentheses"));
                }
            }
            b',' if !in_quote && depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if depth != 0 || in_quote {
        return Err(Error::malformed(body, "unbalanced parentheses or quotes"));
    }
    parts.push(&body[start..]);
    Ok(parts)
}

/// Identifier prefixes that make a tuple element *positional* even though
/// it superficially matches `<ident> WS <type>` (e.g. the element text
/// `"Int64"` alone must never be parsed as a name-typed element named
/// `Int`). Checked against the leading identifier of a candidate element.
const RESERVED_TYPE_PREFIXES: &[&str] = &[
    "UInt8", "UInt16", "UInt32", "UInt64", "UInt128", "UInt256", "Int8", "Int16", "Int32",
    "Int64", "Int128", "Int256", "Float32", "Float64", "Bool", "String", "FixedString", "Date",
    "Date32", "DateTime", "DateTime64", "UUID", "IPv4", "IPv6", "Nothing", "Nullable", "Array",
    "Tuple", "Map", "LowCardinality", "Enum8", "Enum16", "Decimal", "Decimal32", "Decimal64",
    "Decimal128", "Decimal256", "Variant", "Dynamic", "JSON", "Object", "Nested", "Point", "Ring",
    "Polygon", "MultiPolygon",
];

/// One element of a `Tuple`'s argument list: either bare positional text
/// or a `name type` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleElement {
    Positional(String),
    Named(String, String),
}

/// Classifies a single raw `Tuple` argument (already split at top-level
/// commas by [`split_top_level`]) as named or positional.
///
/// An element is named when it matches `<ident> WS <rest>` *and* the
/// leading identifier is not one of [`RESERVED_TYPE_PREFIXES`] — so
/// `Tuple(Int64, String)` stays positional while
/// `Tuple(a Int64, b String)` is named.
pub fn classify_tuple_element(raw: &str) -> TupleElement {
    let raw = raw.trim();
    if let Some(space_at) = raw.find(char::is_whitespace) {
        let ident = &raw[..space_at];
        let rest = raw[space_at..].trim_start();
        if is_plain_ident(ident) && !RESERVED_TYPE_PREFIXES.contains(&ident) && !rest.is_empty() {
            return TupleElement::Named(ident.to_string(), rest.to_string());
        }
    }
    TupleElement::Positional(raw.to_string())
}

fn is_plain_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
