//! Time-bucketing schemes for rolling leaderboard windows.
//!
//! A [`TimeRange`] knows how to name the slot a point in time falls into,
//! how long boards in that range live, and where the wall-clock boundaries of
//! a window lie. Weeks start on Monday and all computations are in UTC.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Delimiter used between the segments of board keys.
pub const KEY_DELIMITER: &str = "/";

const DAY_SECONDS: u64 = 60 * 60 * 24;
const WEEK_SECONDS: u64 = DAY_SECONDS * 7;
const MONTH_SECONDS: u64 = DAY_SECONDS * 31;

/// Last second of a window, relative to its first second.
const LAST_SECOND_OF_DAY: i64 = DAY_SECONDS as i64 - 1;

/// Upper bound of the all-time window (largest 32-bit Unix timestamp).
const ALL_TIME_END_SECONDS: i64 = 2_147_483_647;

/// Errors raised while computing window boundaries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeRangeError {
    /// The requested window lies outside the representable calendar
    #[error("window {slots_ago} slots ago is out of range for '{code}'")]
    OutOfRange {
        /// Range code
        code: &'static str,
        /// Requested number of windows back
        slots_ago: u32,
    },
}

/// The bucketing scheme of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKind {
    /// One board per calendar day
    Daily,
    /// One board per Monday-to-Sunday week
    Weekly,
    /// One board per calendar month
    Monthly,
    /// A single board that never rolls over
    AllTime,
}

impl RangeKind {
    /// Short code used in board keys and HTTP paths.
    pub fn code(&self) -> &'static str {
        match self {
            RangeKind::Daily => "d",
            RangeKind::Weekly => "w",
            RangeKind::Monthly => "m",
            RangeKind::AllTime => "a",
        }
    }
}

/// Inclusive wall-clock boundaries of one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// First second of the window
    pub start: DateTime<Utc>,
    /// Last second of the window
    pub end: DateTime<Utc>,
}

/// A time-bucketing scheme with its slot format and expiration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    kind: RangeKind,
    slot_format: &'static str,
    expiration: Option<Duration>,
    key_delimiter: &'static str,
}

impl TimeRange {
    /// Daily boards, kept for three days.
    pub const DAILY: TimeRange = TimeRange {
        kind: RangeKind::Daily,
        slot_format: "%Y%m%d",
        expiration: Some(Duration::from_secs(3 * DAY_SECONDS)),
        key_delimiter: KEY_DELIMITER,
    };

    /// Weekly boards, kept for two weeks and two days.
    pub const WEEKLY: TimeRange = TimeRange {
        kind: RangeKind::Weekly,
        slot_format: "%Y%W",
        expiration: Some(Duration::from_secs(2 * WEEK_SECONDS + 2 * DAY_SECONDS)),
        key_delimiter: KEY_DELIMITER,
    };

    /// Monthly boards, kept for two months and two days.
    pub const MONTHLY: TimeRange = TimeRange {
        kind: RangeKind::Monthly,
        slot_format: "%Y%m",
        expiration: Some(Duration::from_secs(2 * MONTH_SECONDS + 2 * DAY_SECONDS)),
        key_delimiter: KEY_DELIMITER,
    };

    /// The all-time board. Its slot is constant and it never expires.
    pub const ALL_TIME: TimeRange = TimeRange {
        kind: RangeKind::AllTime,
        slot_format: "a",
        expiration: None,
        key_delimiter: KEY_DELIMITER,
    };

    /// Every range, in the order boards are written.
    pub const ALL: [TimeRange; 4] = [
        TimeRange::DAILY,
        TimeRange::WEEKLY,
        TimeRange::MONTHLY,
        TimeRange::ALL_TIME,
    ];

    /// Look up one of the standard ranges by its code.
    pub fn from_code(code: &str) -> Option<TimeRange> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Bucketing scheme.
    pub fn kind(&self) -> RangeKind {
        self.kind
    }

    /// Short code (`d`, `w`, `m`, `a`).
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// strftime-style format used for the slot segment.
    pub fn slot_format(&self) -> &'static str {
        self.slot_format
    }

    /// TTL applied to boards after each write, `None` for boards that never expire.
    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    /// Delimiter joining the code and the slot.
    pub fn key_delimiter(&self) -> &'static str {
        self.key_delimiter
    }

    /// Override the TTL of this range. The all-time range stays non-expiring.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        if self.kind != RangeKind::AllTime {
            self.expiration = Some(expiration);
        }
        self
    }

    /// Join the range code with `date` formatted per the slot format.
    pub fn format_slot(&self, date: DateTime<Utc>) -> String {
        let slot = match self.kind {
            RangeKind::AllTime => self.slot_format.to_string(),
            _ => date.format(self.slot_format).to_string(),
        };
        [self.code(), slot.as_str()].join(self.key_delimiter)
    }

    /// Slot key of the window `slots_ago` periods before the one containing `now`.
    pub fn slot_key(&self, slots_ago: u32, now: DateTime<Utc>) -> Result<String, TimeRangeError> {
        if slots_ago == 0 {
            return Ok(self.format_slot(now));
        }
        let window = self.window_bounds(slots_ago, now)?;
        Ok(self.format_slot(window.start))
    }

    /// Inclusive boundaries of the window `slots_ago` periods before the one
    /// containing `now`.
    pub fn window_bounds(&self, slots_ago: u32, now: DateTime<Utc>) -> Result<Window, TimeRangeError> {
        let out_of_range = || TimeRangeError::OutOfRange {
            code: self.code(),
            slots_ago,
        };
        let today = now.date_naive();

        let (first, last) = match self.kind {
            RangeKind::Daily => {
                let day = today
                    .checked_sub_days(Days::new(u64::from(slots_ago)))
                    .ok_or_else(out_of_range)?;
                (day, day)
            }
            RangeKind::Weekly => {
                let day = today
                    .checked_sub_days(Days::new(7 * u64::from(slots_ago)))
                    .ok_or_else(out_of_range)?;
                let from_monday = u64::from(day.weekday().num_days_from_monday());
                let monday = day
                    .checked_sub_days(Days::new(from_monday))
                    .ok_or_else(out_of_range)?;
                let sunday = monday
                    .checked_add_days(Days::new(6))
                    .ok_or_else(out_of_range)?;
                (monday, sunday)
            }
            RangeKind::Monthly => {
                let index = i64::from(today.year()) * 12 + i64::from(today.month0())
                    - i64::from(slots_ago);
                let year = i32::try_from(index.div_euclid(12)).map_err(|_| out_of_range())?;
                let month = index.rem_euclid(12) as u32 + 1;
                let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
                let last = last_day_of_month(first).ok_or_else(out_of_range)?;
                (first, last)
            }
            RangeKind::AllTime => {
                let start = Utc.timestamp_opt(0, 0).single().ok_or_else(out_of_range)?;
                let end = Utc
                    .timestamp_opt(ALL_TIME_END_SECONDS, 0)
                    .single()
                    .ok_or_else(out_of_range)?;
                return Ok(Window { start, end });
            }
        };

        let start = midnight(first);
        let end = midnight(last) + chrono::Duration::seconds(LAST_SECOND_OF_DAY);
        Ok(Window { start, end })
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::MIN))
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    first.checked_add_months(chrono::Months::new(1))?.pred_opt()
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        TimeRange::from_code(&code)
            .ok_or_else(|| de::Error::custom(format!("unknown time range code '{}'", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_codes_and_lookup() {
        assert_eq!(TimeRange::DAILY.code(), "d");
        assert_eq!(TimeRange::WEEKLY.code(), "w");
        assert_eq!(TimeRange::MONTHLY.code(), "m");
        assert_eq!(TimeRange::ALL_TIME.code(), "a");
        assert_eq!(TimeRange::from_code("w"), Some(TimeRange::WEEKLY));
        assert_eq!(TimeRange::from_code("x"), None);
    }

    #[test]
    fn test_expirations() {
        assert_eq!(TimeRange::DAILY.expiration(), Some(Duration::from_secs(259_200)));
        assert_eq!(TimeRange::WEEKLY.expiration(), Some(Duration::from_secs(1_382_400)));
        assert_eq!(TimeRange::MONTHLY.expiration(), Some(Duration::from_secs(5_529_600)));
        assert_eq!(TimeRange::ALL_TIME.expiration(), None);
    }

    #[test]
    fn test_with_expiration_keeps_all_time_forever() {
        let daily = TimeRange::DAILY.with_expiration(Duration::from_secs(60));
        assert_eq!(daily.expiration(), Some(Duration::from_secs(60)));

        let all_time = TimeRange::ALL_TIME.with_expiration(Duration::from_secs(60));
        assert_eq!(all_time.expiration(), None);
    }

    #[test]
    fn test_format_slot() {
        let now = at(2013, 2, 7, 15, 30, 0);
        assert_eq!(TimeRange::DAILY.format_slot(now), "d/20130207");
        assert_eq!(TimeRange::WEEKLY.format_slot(now), "w/201305");
        assert_eq!(TimeRange::MONTHLY.format_slot(now), "m/201302");
        assert_eq!(TimeRange::ALL_TIME.format_slot(now), "a/a");
    }

    #[test]
    fn test_slot_key_slots_ago_uses_window_start() {
        let now = at(2013, 3, 1, 0, 0, 1);
        assert_eq!(TimeRange::DAILY.slot_key(1, now).unwrap(), "d/20130228");
        assert_eq!(TimeRange::MONTHLY.slot_key(1, now).unwrap(), "m/201302");
        assert_eq!(TimeRange::ALL_TIME.slot_key(5, now).unwrap(), "a/a");
    }

    #[test]
    fn test_daily_bounds() {
        let now = at(2024, 3, 1, 10, 0, 0);
        let window = TimeRange::DAILY.window_bounds(0, now).unwrap();
        assert_eq!(window.start, at(2024, 3, 1, 0, 0, 0));
        assert_eq!(window.end, at(2024, 3, 1, 23, 59, 59));

        // Leap day.
        let window = TimeRange::DAILY.window_bounds(1, now).unwrap();
        assert_eq!(window.start, at(2024, 2, 29, 0, 0, 0));
        assert_eq!(window.end, at(2024, 2, 29, 23, 59, 59));
    }

    #[test]
    fn test_weekly_bounds_monday_to_sunday() {
        // Wednesday
        let now = at(2024, 5, 15, 8, 0, 0);
        let window = TimeRange::WEEKLY.window_bounds(0, now).unwrap();
        assert_eq!(window.start, at(2024, 5, 13, 0, 0, 0));
        assert_eq!(window.end, at(2024, 5, 19, 23, 59, 59));

        let window = TimeRange::WEEKLY.window_bounds(2, now).unwrap();
        assert_eq!(window.start, at(2024, 4, 29, 0, 0, 0));
        assert_eq!(window.end, at(2024, 5, 5, 23, 59, 59));
    }

    #[test]
    fn test_weekly_bounds_on_sunday_and_monday() {
        let sunday = at(2024, 5, 19, 23, 0, 0);
        let window = TimeRange::WEEKLY.window_bounds(0, sunday).unwrap();
        assert_eq!(window.start, at(2024, 5, 13, 0, 0, 0));

        let monday = at(2024, 5, 20, 0, 0, 0);
        let window = TimeRange::WEEKLY.window_bounds(0, monday).unwrap();
        assert_eq!(window.start, at(2024, 5, 20, 0, 0, 0));
        assert_eq!(window.end, at(2024, 5, 26, 23, 59, 59));
    }

    #[test]
    fn test_monthly_bounds() {
        let now = at(2023, 3, 10, 0, 0, 0);
        let window = TimeRange::MONTHLY.window_bounds(1, now).unwrap();
        assert_eq!(window.start, at(2023, 2, 1, 0, 0, 0));
        assert_eq!(window.end, at(2023, 2, 28, 23, 59, 59));

        let window = TimeRange::MONTHLY.window_bounds(0, now).unwrap();
        assert_eq!(window.end, at(2023, 3, 31, 23, 59, 59));
    }

    #[test]
    fn test_monthly_year_rollover() {
        let now = at(2023, 3, 10, 0, 0, 0);

        // slots_ago == current month lands in December of the previous year
        let window = TimeRange::MONTHLY.window_bounds(3, now).unwrap();
        assert_eq!(window.start, at(2022, 12, 1, 0, 0, 0));
        assert_eq!(window.end, at(2022, 12, 31, 23, 59, 59));

        let window = TimeRange::MONTHLY.window_bounds(14, now).unwrap();
        assert_eq!(window.start, at(2022, 1, 1, 0, 0, 0));

        let window = TimeRange::MONTHLY.window_bounds(15, now).unwrap();
        assert_eq!(window.start, at(2021, 12, 1, 0, 0, 0));

        let window = TimeRange::MONTHLY.window_bounds(26, now).unwrap();
        assert_eq!(window.start, at(2021, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_all_time_bounds() {
        let now = at(2023, 3, 10, 0, 0, 0);
        let window = TimeRange::ALL_TIME.window_bounds(0, now).unwrap();
        assert_eq!(window.start.timestamp(), 0);
        assert_eq!(window.end.timestamp(), 2_147_483_647);
        assert_eq!(TimeRange::ALL_TIME.window_bounds(9, now).unwrap(), window);
    }

    #[test]
    fn test_out_of_range_window() {
        let now = at(2023, 3, 10, 0, 0, 0);
        let err = TimeRange::DAILY.window_bounds(u32::MAX, now).unwrap_err();
        assert_eq!(
            err,
            TimeRangeError::OutOfRange {
                code: "d",
                slots_ago: u32::MAX
            }
        );
        assert!(TimeRange::MONTHLY.window_bounds(u32::MAX, now).is_err());
    }

    #[test]
    fn test_serde_as_code() {
        let json = serde_json::to_string(&TimeRange::WEEKLY).unwrap();
        assert_eq!(json, "\"w\"");
        let parsed: TimeRange = serde_json::from_str("\"m\"").unwrap();
        assert_eq!(parsed, TimeRange::MONTHLY);
        assert!(serde_json::from_str::<TimeRange>("\"q\"").is_err());
    }
}
