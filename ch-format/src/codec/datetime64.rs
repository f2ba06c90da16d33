//! `DateTime64(precision[, timezone])` (spec §4.5 "DateTime64Codec").
//!
//! Stored on the wire as a signed 64-bit tick count, where a tick is
//! `10^(-precision)` seconds since the Unix epoch. The timezone parameter
//! (when present in the textual type) affects only formatting a value for
//! display, never the wire bytes, so it is not carried on the codec at
//! all — only `precision` participates in encode/decode.

use ch_types::{fixed, Buffer, Cursor};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime64Codec {
    pub precision: u8,
}

impl DateTime64Codec {
    pub fn type_name(&self) -> String {
        format!("DateTime64({})", self.precision)
    }

    pub fn encode(&self, buf: &mut Buffer, ticks: i64) {
        fixed::write_i64(buf, ticks);
    }

    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<i64> {
        Ok(fixed::read_i64(cursor)?)
    }

    /// `10^|precision - 3|`, the scaling factor between millisecond epoch
    /// values and this column's tick unit.
    fn pow(&self) -> i64 {
        10i64.pow((self.precision as i32 - 3).unsigned_abs())
    }

    /// Converts a millisecond-epoch timestamp into this column's tick
    /// unit, silently truncating/overflowing exactly as the source does
    /// (spec §9 Open Question: "explicit overflow detection is
    /// recommended but not in the source"). Use [`Self::millis_to_ticks_checked`]
    /// for the validating path.
    pub fn millis_to_ticks(&self, millis: i64) -> i64 {
        let pow = self.pow();
        if self.precision >= 3 {
            millis.wrapping_mul(pow)
        } else {
            millis / pow
        }
    }

    /// As [`Self::millis_to_ticks`], but fails with [`Error::RangeError`]
    /// instead of silently overflowing on the multiply path.
    pub fn millis_to_ticks_checked(&self, millis: i64) -> Result<i64> {
        let pow = self.pow();
        if self.precision >= 3 {
            millis.checked_mul(pow).ok_or_else(|| Error::RangeError {
                type_name: self.type_name(),
            })
        } else {
            Ok(millis / pow)
        }
    }

    /// Converts ticks back to millisecond epoch, losslessly when
    /// `precision <= 3` and by truncation otherwise; use
    /// [`Self::ticks_to_millis_checked`] to reject the lossy case.
    pub fn ticks_to_millis(&self, ticks: i64) -> i64 {
        let pow = self.pow();
        if self.precision >= 3 {
            ticks / pow
        } else {
            ticks.wrapping_mul(pow)
        }
    }

    /// As [`Self::ticks_to_millis`], but fails with
    /// [`Error::PrecisionLoss`] when `precision > 3` and the tick count
    /// does not divide evenly into milliseconds.
    pub fn ticks_to_millis_checked(&self, ticks: i64) -> Result<i64> {
        let pow = self.pow();
        if self.precision >= 3 {
            if ticks % pow != 0 {
                return Err(Error::PrecisionLoss {
                    type_name: self.type_name(),
                });
            }
            Ok(ticks / pow)
        } else {
            ticks.checked_mul(pow).ok_or_else(|| Error::RangeError {
                type_name: self.type_name(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ticks() {
        let codec = DateTime64Codec { precision: 3 };
        let mut buf = Buffer::new();
        codec.encode(&mut buf, 1_700_000_000_123);
        let bytes = buf.finish();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(codec.decode(&mut cursor).unwrap(), 1_700_000_000_123);
    }

    #[test]
    fn millis_to_ticks_precision_above_three_scales_up() {
        let codec = DateTime64Codec { precision: 6 };
        assert_eq!(codec.millis_to_ticks(1), 1_000);
    }

    #[test]
    fn millis_to_ticks_precision_below_three_scales_down() {
        let codec = DateTime64Codec { precision: 0 };
        assert_eq!(codec.millis_to_ticks(2_000), 2);
    }

    #[test]
    fn precision_loss_detected_on_strict_conversion() {
        let codec = DateTime64Codec { precision: 6 };
        assert!(codec.ticks_to_millis_checked(1_000_001).is_err());
        assert_eq!(codec.ticks_to_millis_checked(1_000_000).unwrap(), 1);
    }

    #[test]
    fn overflow_detected_on_checked_path() {
        let codec = DateTime64Codec { precision: 9 };
        assert!(codec.millis_to_ticks_checked(i64::MAX).is_err());
    }
}
