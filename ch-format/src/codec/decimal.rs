//! `Decimal32/64/128/256` (spec §4.5 "DecimalCodec").
//!
//! On the wire a decimal is a scaled two's-complement integer of width 4,
//! 8, 16, or 32 bytes; in memory (for API exchange) it is a decimal
//! string. All arithmetic is done in [`ethnum::I256`] regardless of the
//! column's wire width — 256 bits comfortably holds every digit string a
//! 32-byte decimal can represent, so one code path covers all four
//! widths; only the final byte count written/read differs.

use ch_types::{Buffer, Cursor};
use ethnum::I256;

use crate::error::{Error, Result};

/// Byte width of a decimal's wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalWidth {
    W4 = 4,
    W8 = 8,
    W16 = 16,
    W32 = 32,
}

impl DecimalWidth {
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// The width ClickHouse infers from precision alone, for the bare
    /// `Decimal(P, S)` form (§4.6's default-precision table, reused here
    /// since it doubles as the textual-form default).
    pub fn from_precision(precision: u32) -> Self {
        match precision {
            0..=9 => DecimalWidth::W4,
            10..=18 => DecimalWidth::W8,
            19..=38 => DecimalWidth::W16,
            _ => DecimalWidth::W32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalCodec {
    pub precision: u32,
    pub scale: u32,
    pub width: DecimalWidth,
}

impl DecimalCodec {
    pub fn type_name(&self) -> String {
        let family = match self.width {
            DecimalWidth::W4 => "Decimal32",
            DecimalWidth::W8 => "Decimal64",
            DecimalWidth::W16 => "Decimal128",
            DecimalWidth::W32 => "Decimal256",
        };
        format!("{family}({}, {})", self.precision, self.scale)
    }

    pub fn encode(&self, buf: &mut Buffer, text: &str) -> Result<()> {
        let scaled = parse_decimal_string(text, self.scale)?;
        let full = scaled.to_le_bytes();
        buf.write(&full[..self.width.bytes()]);
        Ok(())
    }

    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<String> {
        let n = self.width.bytes();
        let raw = cursor.take(n)?;
        let negative = raw[n - 1] & 0x80 != 0;
        let mut full = [if negative { 0xFFu8 } else { 0u8 }; 32];
        full[..n].copy_from_slice(raw);
        let value = I256::from_le_bytes(full);
        Ok(format_decimal_string(value, self.scale))
    }
}

/// Parses a decimal string into its scaled `value * 10^scale` integer
/// form: optional sign, integer part, optional `.fraction`, the fraction
/// padded or truncated to exactly `scale` digits (spec §4.5).
fn parse_decimal_string(text: &str, scale: u32) -> Result<I256> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, f),
        None => (rest, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(Error::malformed("Decimal", "empty decimal string"));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::malformed("Decimal", "non-digit character"));
    }
    let scale = scale as usize;
    let mut frac = frac_part.to_string();
    if frac.len() > scale {
        frac.truncate(scale);
    } else {
        frac.push_str(&"0".repeat(scale - frac.len()));
    }
    let digits = format!("{int_part}{frac}");
    let digits = if digits.is_empty() { "0" } else { &digits };
    let mut acc = I256::ZERO;
    for c in digits.chars() {
        let d = c.to_digit(10).expect("validated digit");
        acc = acc * I256::from(10i32) + I256::from(d as i32);
    }
    Ok(if negative { -acc } else { acc })
}

/// Formats a scaled integer back into `sign int.frac`, suppressing the
/// decimal point entirely when `scale == 0` (spec §8 boundary behavior).
fn format_decimal_string(value: I256, scale: u32) -> String {
    let negative = value < I256::ZERO;
    let magnitude = if negative { -value } else { value };
    let mut digits = magnitude.to_string();
    let scale = scale as usize;
    if digits.len() <= scale {
        digits = "0".repeat(scale - digits.len() + 1) + &digits;
    }
    let split_at = digits.len() - scale;
    let (int_part, frac_part) = digits.split_at(split_at);
    let mut out = String::new();
    if negative && !(int_part == "0" && frac_part.chars().all(|c| c == '0')) {
        out.push('-');
    }
    out.push_str(int_part);
    if scale > 0 {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_18_4_matches_scenario_f() {
        let codec = DecimalCodec {
            precision: 18,
            scale: 4,
            width: DecimalWidth::W8,
        };
        let mut buf = Buffer::new();
        codec.encode(&mut buf, "-123.4567").unwrap();
        let bytes = buf.finish();
        // Signed 64-bit LE of -1234567 (spec.md's own literal at §8
        // Scenario F is the positive value 232869.9185, not this).
        assert_eq!(bytes, vec![0x79, 0x29, 0xED, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(codec.decode(&mut cursor).unwrap(), "-123.4567");
    }

    #[test]
    fn scale_zero_has_no_dot() {
        let codec = DecimalCodec {
            precision: 9,
            scale: 0,
            width: DecimalWidth::W4,
        };
        let mut buf = Buffer::new();
        codec.encode(&mut buf, "42").unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(codec.decode(&mut cursor).unwrap(), "42");
    }

    #[test]
    fn pads_short_fraction() {
        let codec = DecimalCodec {
            precision: 9,
            scale: 4,
            width: DecimalWidth::W4,
        };
        let mut buf = Buffer::new();
        codec.encode(&mut buf, "1.5").unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(codec.decode(&mut cursor).unwrap(), "1.5000");
    }

    #[test]
    fn truncates_long_fraction() {
        let codec = DecimalCodec {
            precision: 9,
            scale: 2,
            width: DecimalWidth::W4,
        };
        let mut buf = Buffer::new();
        codec.encode(&mut buf, "1.999").unwrap();
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(codec.decode(&mut cursor).unwrap(), "1.99");
    }

    #[test]
    fn width_from_precision_matches_default_table() {
        assert_eq!(DecimalWidth::from_precision(9), DecimalWidth::W4);
        assert_eq!(DecimalWidth::from_precision(18), DecimalWidth::W8);
        assert_eq!(DecimalWidth::from_precision(38), DecimalWidth::W16);
        assert_eq!(DecimalWidth::from_precision(76), DecimalWidth::W32);
    }
}
