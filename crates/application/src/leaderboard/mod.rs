//! Leaderboard engine
//!
//! A [`Leaderboard`] owns one `(game, metric)` family of boards, one board per
//! configured time range and slot. Writes fan out to every range; reads target
//! a single range and slot.

mod engine;
mod friends;

pub use engine::*;
pub use friends::EphemeralKey;

use leaders_domain::TimeRange;

use crate::{LeaderboardError, LeaderboardResult};

/// Construction parameters for a [`Leaderboard`].
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardConfig {
    /// Game identifier, first key segment
    pub game: String,
    /// Metric identifier, second key segment
    pub metric: String,
    /// Ranges every write fans out to
    pub ranges: Vec<TimeRange>,
    /// True for high-to-low ordering
    pub reverse: bool,
    /// Encode a timestamp into each score to break ties
    pub timed_ties: bool,
    /// With `timed_ties`, earlier timestamps win ties
    pub tie_oldest_wins: bool,
}

impl LeaderboardConfig {
    /// Config with every range, high-to-low ordering and no tie-breaking.
    pub fn new(game: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            metric: metric.into(),
            ranges: TimeRange::ALL.to_vec(),
            reverse: true,
            timed_ties: false,
            tie_oldest_wins: true,
        }
    }

    /// Validate identifiers and ranges.
    pub fn validate(&self) -> LeaderboardResult<()> {
        for (name, value) in [("game", &self.game), ("metric", &self.metric)] {
            if value.is_empty() {
                return Err(LeaderboardError::InvalidInput(format!(
                    "{} must not be empty",
                    name
                )));
            }
        }

        if self.ranges.is_empty() {
            return Err(LeaderboardError::InvalidInput(
                "at least one time range is required".to_string(),
            ));
        }

        for (i, range) in self.ranges.iter().enumerate() {
            if self.ranges[..i].iter().any(|r| r.code() == range.code()) {
                return Err(LeaderboardError::InvalidInput(format!(
                    "time range '{}' configured twice",
                    range.code()
                )));
            }
        }

        Ok(())
    }
}

/// Parameters of a ranked query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadersQuery {
    /// Maximum entries to return; `None` or `Some(0)` means the whole board
    pub limit: Option<u64>,
    /// Rank position to start at, ignored when centering
    pub offset: u64,
    /// Center the slice on this member ("leaders near me")
    pub center_on: Option<String>,
    /// Windows before the current one, e.g. 1 for yesterday
    pub slots_ago: u32,
}

impl LeadersQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn center_on(mut self, member: impl Into<String>) -> Self {
        self.center_on = Some(member.into());
        self
    }

    pub fn slots_ago(mut self, slots_ago: u32) -> Self {
        self.slots_ago = slots_ago;
        self
    }

    /// The limit, with zero folded into "unbounded".
    pub(crate) fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|limit| *limit > 0)
    }

    /// Inclusive store index ending a slice that starts at `offset`.
    pub(crate) fn end_index(&self, offset: u64) -> i64 {
        match self.effective_limit() {
            Some(limit) => store_index(offset.saturating_add(limit - 1)),
            None => -1,
        }
    }

    /// Start position and inclusive end index of a slice centered on the
    /// member at 0-based `rank`.
    pub(crate) fn centered_bounds(&self, rank: u64) -> (u64, i64) {
        match self.effective_limit() {
            Some(limit) => {
                let above = limit / 2 + limit % 2;
                let offset = rank.saturating_add(1).saturating_sub(above);
                (offset, store_index(rank.saturating_add(limit / 2)))
            }
            None => (0, -1),
        }
    }
}

/// Clamp a rank position to the store's signed index space. Positions past
/// `i64::MAX` are past the end of any board.
pub(crate) fn store_index(position: u64) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}
