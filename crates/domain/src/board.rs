//! Board key derivation and sort direction.

use crate::time_range::KEY_DELIMITER;
use serde::{Deserialize, Serialize};

/// First segment of every board key.
pub const BOARD_KEY_ROOT: &str = "leaders";

/// Build the key of the board for `(game, metric)` in the given slot.
///
/// Keys have the shape `leaders/{game}/{metric}/{range_code}/{slot}`,
/// e.g. `leaders/combat/highscore/d/20130207`.
pub fn board_key(game: &str, metric: &str, slot_key: &str) -> String {
    [BOARD_KEY_ROOT, game, metric, slot_key].join(KEY_DELIMITER)
}

/// Direction in which members are read from a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Lowest score first
    Ascending,
    /// Highest score first
    Descending,
}

impl SortOrder {
    /// `reverse == true` ranks the highest score first.
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    /// Whether this order lists the highest score first.
    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Descending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeRange;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_board_key_format() {
        assert_eq!(
            board_key("combat", "highscore", "d/20130207"),
            "leaders/combat/highscore/d/20130207"
        );
    }

    #[test]
    fn test_board_key_is_deterministic_within_a_day() {
        let morning = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 5).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap();
        let a = board_key("g", "m", &TimeRange::DAILY.slot_key(0, morning).unwrap());
        let b = board_key("g", "m", &TimeRange::DAILY.slot_key(0, evening).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_sort_order_from_reverse() {
        assert_eq!(SortOrder::from_reverse(true), SortOrder::Descending);
        assert_eq!(SortOrder::from_reverse(false), SortOrder::Ascending);
        assert!(SortOrder::Descending.is_descending());
    }
}
