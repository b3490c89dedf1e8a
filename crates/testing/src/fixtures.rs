//! Test fixtures for leaderboard scenarios.

use chrono::{DateTime, TimeZone, Utc};

/// A Thursday in early February, away from any week or month boundary.
pub fn reference_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 2, 7, 12, 0, 0).unwrap()
}

/// Member id for the i-th fixture player.
pub fn player(i: u32) -> String {
    format!("player{}", i)
}

/// `player1..=playerN` scored `1.0..=N`.
pub fn player_scores(n: u32) -> Vec<(String, f64)> {
    (1..=n).map(|i| (player(i), i as f64)).collect()
}

/// Five friends, one of whom never scored on a 20-player board.
pub fn friends_list() -> Vec<String> {
    ["player3", "player12", "player13", "playernothere", "player18"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Three increasing timestamps one second apart, for tie-break scenarios.
pub fn tie_break_timestamps() -> [DateTime<Utc>; 3] {
    [
        Utc.timestamp_opt(1_400_000_001, 0).unwrap(),
        Utc.timestamp_opt(1_400_000_002, 0).unwrap(),
        Utc.timestamp_opt(1_400_000_003, 0).unwrap(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_scores() {
        let scores = player_scores(3);
        assert_eq!(scores[0], ("player1".to_string(), 1.0));
        assert_eq!(scores[2], ("player3".to_string(), 3.0));
    }

    #[test]
    fn test_friends_list_has_one_outsider() {
        let friends = friends_list();
        assert_eq!(friends.len(), 5);
        assert!(friends.contains(&"playernothere".to_string()));
    }
}
