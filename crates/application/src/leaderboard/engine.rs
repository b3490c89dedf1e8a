//! Leaderboard engine - writes, ranked reads and clearing

use chrono::{DateTime, Utc};
use leaders_domain::{
    board_key, Clock, Leader, LeadersResult, SortOrder, SystemClock, TimeRange,
};
use leaders_infrastructure::OrderedSetStore;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{LeaderboardConfig, LeadersQuery};
use crate::codec::ScoreCodec;
use crate::ranks::RankAssigner;
use crate::{LeaderboardError, LeaderboardResult};

/// Leaderboards for one `(game, metric)` pair across its time ranges.
pub struct Leaderboard {
    config: LeaderboardConfig,
    store: Arc<dyn OrderedSetStore>,
    clock: Arc<dyn Clock>,
    codec: Option<ScoreCodec>,
}

impl Leaderboard {
    /// Create a leaderboard on the given store, using the system clock.
    pub fn new(config: LeaderboardConfig, store: Arc<dyn OrderedSetStore>) -> LeaderboardResult<Self> {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create a leaderboard with an explicit clock.
    pub fn with_clock(
        config: LeaderboardConfig,
        store: Arc<dyn OrderedSetStore>,
        clock: Arc<dyn Clock>,
    ) -> LeaderboardResult<Self> {
        config.validate()?;
        let codec = config
            .timed_ties
            .then(|| ScoreCodec::new(config.reverse, config.tie_oldest_wins));

        Ok(Self {
            config,
            store,
            clock,
            codec,
        })
    }

    /// Start building a leaderboard.
    pub fn builder(game: impl Into<String>, metric: impl Into<String>) -> LeaderboardBuilder {
        LeaderboardBuilder::new(game, metric)
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    pub fn ranges(&self) -> &[TimeRange] {
        &self.config.ranges
    }

    /// Direction the store is read in.
    pub fn order(&self) -> SortOrder {
        SortOrder::from_reverse(self.config.reverse)
    }

    pub(crate) fn store(&self) -> &Arc<dyn OrderedSetStore> {
        &self.store
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolve a configured range by its code.
    pub fn range(&self, code: &str) -> LeaderboardResult<TimeRange> {
        self.config
            .ranges
            .iter()
            .copied()
            .find(|range| range.code() == code)
            .ok_or_else(|| LeaderboardError::UnknownRange(code.to_string()))
    }

    /// Key of the board for `range`, `slots_ago` windows before the current one.
    pub fn board_key(&self, range: &TimeRange, slots_ago: u32) -> LeaderboardResult<String> {
        self.board_key_at(range, slots_ago, self.now())
    }

    pub(crate) fn board_key_at(
        &self,
        range: &TimeRange,
        slots_ago: u32,
        now: DateTime<Utc>,
    ) -> LeaderboardResult<String> {
        let slot = range.slot_key(slots_ago, now)?;
        let key = board_key(&self.config.game, &self.config.metric, &slot);
        debug!(key = %key, slots_ago = slots_ago, "Board key derived");
        Ok(key)
    }

    /// Set the member's score on every range, replacing any earlier score
    /// (peak semantics, e.g. a high score).
    ///
    /// With tie-breaking enabled the value is encoded with `timestamp`, or
    /// the current time when none is given.
    #[instrument(skip(self), fields(game = %self.config.game, metric = %self.config.metric))]
    pub async fn set_metric(
        &self,
        member: &str,
        value: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> LeaderboardResult<()> {
        validate_member(member)?;
        if !value.is_finite() {
            return Err(LeaderboardError::InvalidInput(format!(
                "score must be a finite number, got {}",
                value
            )));
        }

        let now = self.now();
        let score = match &self.codec {
            Some(codec) => codec.encode(value, timestamp.unwrap_or(now))?,
            None => value,
        };

        for range in &self.config.ranges {
            let key = self.board_key_at(range, 0, now)?;
            self.store.add_or_update_score(&key, member, score).await?;
            if let Some(ttl) = range.expiration() {
                self.store.expire(&key, ttl).await?;
            }
        }

        debug!(member = %member, score = score, "Metric set");
        Ok(())
    }

    /// Add `delta` to the member's score on every range (cumulative
    /// semantics, e.g. total earned). Timestamps are not encoded on this path.
    #[instrument(skip(self), fields(game = %self.config.game, metric = %self.config.metric))]
    pub async fn inc_metric(
        &self,
        member: &str,
        delta: f64,
        timestamp: Option<DateTime<Utc>>,
    ) -> LeaderboardResult<()> {
        validate_member(member)?;
        if !delta.is_finite() {
            return Err(LeaderboardError::InvalidInput(format!(
                "increment must be a finite number, got {}",
                delta
            )));
        }
        if timestamp.is_some() {
            warn!(member = %member, "Timestamps are not supported when incrementing; ignoring");
        }

        let now = self.now();
        for range in &self.config.ranges {
            let key = self.board_key_at(range, 0, now)?;
            let score = self.store.increment_score(&key, member, delta).await?;
            if let Some(ttl) = range.expiration() {
                self.store.expire(&key, ttl).await?;
            }
            debug!(key = %key, member = %member, score = score, "Metric incremented");
        }

        Ok(())
    }

    /// Ranked slice of one board.
    ///
    /// When centering on a member the query offset is ignored and the slice
    /// is placed around that member's rank. A member that is not on the board
    /// is treated as rank 0.
    #[instrument(skip(self), fields(game = %self.config.game, metric = %self.config.metric))]
    pub async fn leaders(
        &self,
        range: &TimeRange,
        query: &LeadersQuery,
    ) -> LeaderboardResult<LeadersResult> {
        let now = self.now();
        let key = self.board_key_at(range, query.slots_ago, now)?;
        let window = range.window_bounds(query.slots_ago, now)?;

        let (offset, end) = match &query.center_on {
            Some(member) => {
                let rank = match self.store.rank(&key, member, self.order()).await? {
                    Some(rank) => rank,
                    None => {
                        warn!(member = %member, key = %key, "Member not found on board; centering on the top");
                        0
                    }
                };
                debug!(member = %member, rank = rank, "Centering on member");
                query.centered_bounds(rank)
            }
            None => (query.offset, query.end_index(query.offset)),
        };

        let (total, leaders) = self.ranked_slice(&key, offset, end, true).await?;

        Ok(LeadersResult {
            total,
            window_start: window.start,
            window_end: window.end,
            leaders,
        })
    }

    /// Cardinality of `key` and its ranked members between `offset` and `end`.
    pub(crate) async fn ranked_slice(
        &self,
        key: &str,
        offset: u64,
        end: i64,
        decode_ties: bool,
    ) -> LeaderboardResult<(u64, Vec<Leader>)> {
        let total = self.store.cardinality(key).await?;
        let start = match i64::try_from(offset) {
            Ok(start) => start,
            Err(_) => {
                debug!(key = %key, offset = offset, "Offset past the end of the board");
                return Ok((total, Vec::new()));
            }
        };
        let slice = self
            .store
            .range_by_rank(key, start, end, self.order())
            .await?;

        let codec = self.codec.filter(|_| decode_ties);
        let entries = slice.into_iter().map(|entry| match &codec {
            Some(codec) => {
                let (value, timestamp) = codec.decode(entry.score);
                (entry.member, value, timestamp)
            }
            None => (entry.member, entry.score, None),
        });

        let leaders = RankAssigner::assign(entries, offset);
        debug!(key = %key, total = total, returned = leaders.len(), "Ranked slice fetched");
        Ok((total, leaders))
    }

    /// Delete the board for `range`, `slots_ago` windows back. Clearing an
    /// absent board is a no-op; returns whether a board was deleted.
    #[instrument(skip(self), fields(game = %self.config.game, metric = %self.config.metric))]
    pub async fn clear(&self, range: &TimeRange, slots_ago: u32) -> LeaderboardResult<bool> {
        let key = self.board_key(range, slots_ago)?;
        let deleted = self.store.delete(&key).await?;
        info!(key = %key, deleted = deleted, "Board cleared");
        Ok(deleted)
    }

    /// Clear the current slot of every configured range. Earlier slots are
    /// left to expire.
    #[instrument(skip(self), fields(game = %self.config.game, metric = %self.config.metric))]
    pub async fn clear_all(&self) -> LeaderboardResult<()> {
        for range in &self.config.ranges {
            self.clear(range, 0).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Leaderboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Leaderboard")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .finish()
    }
}

fn validate_member(member: &str) -> LeaderboardResult<()> {
    if member.is_empty() {
        return Err(LeaderboardError::InvalidInput(
            "member must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Builder for [`Leaderboard`]
pub struct LeaderboardBuilder {
    config: LeaderboardConfig,
    store: Option<Arc<dyn OrderedSetStore>>,
    clock: Option<Arc<dyn Clock>>,
}

impl LeaderboardBuilder {
    pub fn new(game: impl Into<String>, metric: impl Into<String>) -> Self {
        Self {
            config: LeaderboardConfig::new(game, metric),
            store: None,
            clock: None,
        }
    }

    pub fn ranges(mut self, ranges: impl IntoIterator<Item = TimeRange>) -> Self {
        self.config.ranges = ranges.into_iter().collect();
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.config.reverse = reverse;
        self
    }

    pub fn timed_ties(mut self, timed_ties: bool) -> Self {
        self.config.timed_ties = timed_ties;
        self
    }

    pub fn tie_oldest_wins(mut self, tie_oldest_wins: bool) -> Self {
        self.config.tie_oldest_wins = tie_oldest_wins;
        self
    }

    pub fn store(mut self, store: Arc<dyn OrderedSetStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> LeaderboardResult<Leaderboard> {
        let store = self.store.ok_or_else(|| {
            LeaderboardError::InvalidInput("a store handle is required".to_string())
        })?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Leaderboard::with_clock(self.config, store, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaders_infrastructure::InMemoryOrderedSetStore;
    use leaders_testing::{reference_instant, FixedClock};
    use std::time::Duration;

    fn board(store: Arc<InMemoryOrderedSetStore>) -> Leaderboard {
        Leaderboard::builder("combat", "highscore")
            .store(store)
            .clock(Arc::new(FixedClock::new(reference_instant())))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_store() {
        let err = Leaderboard::builder("g", "m").build().unwrap_err();
        assert!(matches!(err, LeaderboardError::InvalidInput(_)));
    }

    #[test]
    fn test_board_keys() {
        let lb = board(Arc::new(InMemoryOrderedSetStore::new()));
        assert_eq!(
            lb.board_key(&TimeRange::DAILY, 0).unwrap(),
            "leaders/combat/highscore/d/20130207"
        );
        assert_eq!(
            lb.board_key(&TimeRange::DAILY, 1).unwrap(),
            "leaders/combat/highscore/d/20130206"
        );
        assert_eq!(
            lb.board_key(&TimeRange::MONTHLY, 2).unwrap(),
            "leaders/combat/highscore/m/201212"
        );
        assert_eq!(
            lb.board_key(&TimeRange::ALL_TIME, 5).unwrap(),
            "leaders/combat/highscore/a/a"
        );
    }

    #[test]
    fn test_range_lookup() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        let lb = Leaderboard::builder("g", "m")
            .ranges([TimeRange::DAILY])
            .store(store)
            .build()
            .unwrap();
        assert_eq!(lb.range("d").unwrap(), TimeRange::DAILY);
        assert!(matches!(lb.range("w"), Err(LeaderboardError::UnknownRange(code)) if code == "w"));
        assert!(matches!(lb.range("x"), Err(LeaderboardError::UnknownRange(_))));
    }

    #[tokio::test]
    async fn test_set_metric_refreshes_ttl_except_all_time() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        let lb = board(store.clone());
        lb.set_metric("player1", 10.0, None).await.unwrap();

        for range in [TimeRange::DAILY, TimeRange::WEEKLY, TimeRange::MONTHLY] {
            let key = lb.board_key(&range, 0).unwrap();
            assert!(store.ttl(&key).is_some(), "{} should expire", key);
        }
        let all_time = lb.board_key(&TimeRange::ALL_TIME, 0).unwrap();
        assert!(store.contains_key(&all_time));
        assert_eq!(store.ttl(&all_time), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_metric_ttl_matches_range_expiration() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        let lb = board(store.clone());
        lb.set_metric("player1", 10.0, None).await.unwrap();

        let daily = lb.board_key(&TimeRange::DAILY, 0).unwrap();
        assert_eq!(store.ttl(&daily), Some(Duration::from_secs(259_200)));
    }

    #[tokio::test]
    async fn test_set_metric_overwrites() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        let lb = board(store);
        lb.set_metric("player1", 10.0, None).await.unwrap();
        lb.set_metric("player1", 4.0, None).await.unwrap();

        let result = lb.leaders(&TimeRange::DAILY, &LeadersQuery::new()).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.leaders[0].score, 4.0);
    }

    #[tokio::test]
    async fn test_set_metric_rejects_bad_input() {
        let lb = board(Arc::new(InMemoryOrderedSetStore::new()));
        assert!(lb.set_metric("", 1.0, None).await.is_err());
        assert!(lb.set_metric("p", f64::INFINITY, None).await.is_err());
    }

    #[tokio::test]
    async fn test_inc_metric_accumulates() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        let lb = board(store);
        lb.inc_metric("player1", 3.0, None).await.unwrap();
        lb.inc_metric("player1", 4.0, Some(reference_instant())).await.unwrap();

        for range in TimeRange::ALL {
            let result = lb.leaders(&range, &LeadersQuery::new()).await.unwrap();
            assert_eq!(result.leaders[0].score, 7.0);
            assert_eq!(result.leaders[0].timestamp, None);
        }
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let lb = board(Arc::new(InMemoryOrderedSetStore::new()));
        lb.set_metric("player1", 1.0, None).await.unwrap();

        assert!(lb.clear(&TimeRange::DAILY, 0).await.unwrap());
        assert!(!lb.clear(&TimeRange::DAILY, 0).await.unwrap());

        let result = lb.leaders(&TimeRange::DAILY, &LeadersQuery::new()).await.unwrap();
        assert_eq!(result.total, 0);
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_current_slots() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        let lb = board(store.clone());
        let yesterday = lb.board_key(&TimeRange::DAILY, 1).unwrap();
        store.add_or_update_score(&yesterday, "player1", 1.0).await.unwrap();
        lb.set_metric("player1", 1.0, None).await.unwrap();

        lb.clear_all().await.unwrap();

        assert_eq!(store.keys(), vec![yesterday]);
    }
}
