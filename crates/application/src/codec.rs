//! Tie-break score encoding
//!
//! Sorted sets break score ties by member id, which is rarely what a
//! leaderboard wants. With tie-breaking enabled the integer part of a stored
//! score is the visible value and the fractional part carries a timestamp,
//! so the store's own numeric ordering also orders ties by time.
//!
//! The timestamp occupies ten decimal digits, which leaves roughly six
//! significant digits for the value. Values up to [`TIE_BREAK_VALUE_CEILING`]
//! in magnitude decode to the exact second; larger values are accepted but
//! lose timestamp precision.

use chrono::{DateTime, TimeZone, Utc};
use tracing::warn;

use crate::{LeaderboardError, LeaderboardResult};

/// Inverted timestamps are stored as `PIVOT - ts`; also the exclusive upper
/// bound for encodable timestamps.
pub const TIE_BREAK_PIVOT: i64 = 3_000_000_000;

/// Largest value magnitude that round-trips with second precision.
pub const TIE_BREAK_VALUE_CEILING: f64 = 100_000.0;

const SCALE: f64 = 1e-10;
const UNSCALE: f64 = 1e10;

/// Encodes a value and a timestamp into a single orderable score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreCodec {
    invert: bool,
}

impl ScoreCodec {
    /// Codec for a board sorted high-to-low when `reverse` is set, where
    /// earlier timestamps win ties when `tie_oldest_wins` is set.
    pub fn new(reverse: bool, tie_oldest_wins: bool) -> Self {
        Self {
            invert: reverse == tie_oldest_wins,
        }
    }

    /// Whether timestamps are stored inverted around [`TIE_BREAK_PIVOT`].
    pub fn inverts(&self) -> bool {
        self.invert
    }

    /// Pack `value` and `timestamp` into one score.
    ///
    /// `value` must be integral, and `timestamp` must lie between the Unix
    /// epoch and [`TIE_BREAK_PIVOT`] seconds.
    pub fn encode(&self, value: f64, timestamp: DateTime<Utc>) -> LeaderboardResult<f64> {
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(LeaderboardError::InvalidInput(format!(
                "tie-break scores must be whole numbers, got {}",
                value
            )));
        }
        let seconds = timestamp.timestamp();
        if !(0..TIE_BREAK_PIVOT).contains(&seconds) {
            return Err(LeaderboardError::InvalidInput(format!(
                "tie-break timestamp {} is outside the encodable range",
                timestamp
            )));
        }
        if value.abs() > TIE_BREAK_VALUE_CEILING {
            warn!(
                value = value,
                ceiling = TIE_BREAK_VALUE_CEILING,
                "Value exceeds tie-break precision ceiling"
            );
        }

        let ordered = if self.invert {
            TIE_BREAK_PIVOT - seconds
        } else {
            seconds
        };
        Ok(value + ordered as f64 * SCALE)
    }

    /// Recover the value and timestamp from an encoded score.
    pub fn decode(&self, encoded: f64) -> (f64, Option<DateTime<Utc>>) {
        let value = encoded.floor();
        let ordered = ((encoded - value) * UNSCALE).round() as i64;
        let seconds = if self.invert {
            TIE_BREAK_PIVOT - ordered
        } else {
            ordered
        };
        (value, Utc.timestamp_opt(seconds, 0).single())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn test_inversion_rule() {
        assert!(ScoreCodec::new(true, true).inverts());
        assert!(ScoreCodec::new(false, false).inverts());
        assert!(!ScoreCodec::new(true, false).inverts());
        assert!(!ScoreCodec::new(false, true).inverts());
    }

    #[test]
    fn test_encode_layout() {
        let plain = ScoreCodec::new(true, false);
        let encoded = plain.encode(100.0, at(1_400_000_001)).unwrap();
        assert!((encoded - 100.1400000001).abs() < 1e-9);

        let inverted = ScoreCodec::new(true, true);
        let encoded = inverted.encode(100.0, at(1_400_000_001)).unwrap();
        assert!((encoded - 100.1599999999).abs() < 1e-9);
    }

    #[test]
    fn test_oldest_wins_descending() {
        // Descending board: larger score ranks first, so the older entry must
        // encode larger.
        let codec = ScoreCodec::new(true, true);
        let older = codec.encode(100.0, at(1_400_000_001)).unwrap();
        let newer = codec.encode(100.0, at(1_400_000_002)).unwrap();
        assert!(older > newer);
        assert!(newer > 99.9 && older < 101.0);
    }

    #[test]
    fn test_oldest_wins_ascending() {
        let codec = ScoreCodec::new(false, true);
        let older = codec.encode(100.0, at(1_400_000_001)).unwrap();
        let newer = codec.encode(100.0, at(1_400_000_002)).unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_value_still_dominates() {
        let codec = ScoreCodec::new(true, true);
        let low = codec.encode(99.0, at(0)).unwrap();
        let high = codec.encode(100.0, at(TIE_BREAK_PIVOT - 1)).unwrap();
        assert!(low < high);
    }

    #[test]
    fn test_rejects_fractional_value() {
        let codec = ScoreCodec::new(true, true);
        let err = codec.encode(1.5, at(1_400_000_000)).unwrap_err();
        assert!(matches!(err, LeaderboardError::InvalidInput(_)));
        assert!(codec.encode(f64::NAN, at(1_400_000_000)).is_err());
    }

    #[test]
    fn test_rejects_out_of_range_timestamp() {
        let codec = ScoreCodec::new(false, false);
        assert!(codec.encode(1.0, at(-1)).is_err());
        assert!(codec.encode(1.0, at(TIE_BREAK_PIVOT)).is_err());
    }

    #[test]
    fn test_decode_negative_value() {
        let codec = ScoreCodec::new(false, true);
        let encoded = codec.encode(-5.0, at(1_400_000_003)).unwrap();
        assert_eq!(codec.decode(encoded), (-5.0, Some(at(1_400_000_003))));
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(
            value in -100_000i64..=100_000,
            seconds in 0i64..TIE_BREAK_PIVOT,
            reverse in any::<bool>(),
            oldest_wins in any::<bool>(),
        ) {
            let codec = ScoreCodec::new(reverse, oldest_wins);
            let encoded = codec.encode(value as f64, at(seconds)).unwrap();
            prop_assert_eq!(codec.decode(encoded), (value as f64, Some(at(seconds))));
        }
    }
}
