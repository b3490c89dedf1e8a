//! Rank assignment over an already-ordered store slice.

use chrono::{DateTime, Utc};
use leaders_domain::Leader;

/// Numbers entries in the order given. Never re-sorts; the store is the
/// single source of ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankAssigner;

impl RankAssigner {
    /// Assign ranks `offset + 1, offset + 2, ...` to `entries`.
    pub fn assign<I>(entries: I, offset: u64) -> Vec<Leader>
    where
        I: IntoIterator<Item = (String, f64, Option<DateTime<Utc>>)>,
    {
        entries
            .into_iter()
            .zip(offset.saturating_add(1)..)
            .map(|((member, score, timestamp), rank)| Leader {
                member,
                score,
                rank,
                timestamp,
            })
            .collect()
    }
}
