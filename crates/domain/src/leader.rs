//! Ranked result records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ranked entry of a leaderboard query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leader {
    /// Member identifier
    pub member: String,
    /// Visible score. With timed ties enabled this is the decoded integer value
    pub score: f64,
    /// 1-based position within the result set
    pub rank: u64,
    /// Tie-break timestamp, present only when timed ties are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// The result of a leaderboard query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadersResult {
    /// Cardinality of the queried board at query time
    pub total: u64,
    /// First second of the queried window
    pub window_start: DateTime<Utc>,
    /// Last second of the queried window
    pub window_end: DateTime<Utc>,
    /// Ranked entries in board order
    pub leaders: Vec<Leader>,
}

impl LeadersResult {
    /// Number of entries returned.
    pub fn len(&self) -> usize {
        self.leaders.len()
    }

    /// Whether no entries were returned.
    pub fn is_empty(&self) -> bool {
        self.leaders.is_empty()
    }

    /// Look up a returned entry by member id.
    pub fn find(&self, member: &str) -> Option<&Leader> {
        self.leaders.iter().find(|l| l.member == member)
    }
}
