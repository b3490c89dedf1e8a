//! In-memory ordered-set store
//!
//! Mirrors the Redis sorted-set semantics the engine relies on: members are
//! ordered by score, then by member bytes; descending order is the exact
//! reverse; rank indices may be negative; empty sets disappear.
//!
//! Expired sets are hidden from reads at once and swept from memory by the
//! next write to any key.

use async_trait::async_trait;
use leaders_domain::SortOrder;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::store::{OrderedSetStore, ScoredMember, StoreHealthStatus};
use crate::Result;

#[derive(Debug, Default)]
struct Entry {
    scores: HashMap<String, f64>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }

    fn sorted(&self, order: SortOrder) -> Vec<ScoredMember> {
        let mut members: Vec<ScoredMember> = self
            .scores
            .iter()
            .map(|(member, score)| ScoredMember::new(member.clone(), *score))
            .collect();
        members.sort_by(compare_ascending);
        if order.is_descending() {
            members.reverse();
        }
        members
    }
}

fn compare_ascending(a: &ScoredMember, b: &ScoredMember) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.member.as_bytes().cmp(b.member.as_bytes()))
}

/// Resolve Redis-style inclusive rank bounds against a set of `len` members.
fn normalize_bounds(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let mut start = if start < 0 { len + start } else { start };
    let mut stop = if stop < 0 { len + stop } else { stop };
    if start < 0 {
        start = 0;
    }
    if start > stop || start >= len {
        return None;
    }
    if stop >= len {
        stop = len - 1;
    }
    Some((start as usize, stop as usize))
}

/// Process-local sorted-set store.
#[derive(Debug, Default)]
pub struct InMemoryOrderedSetStore {
    sets: RwLock<HashMap<String, Entry>>,
}

impl InMemoryOrderedSetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time to live of a key, `None` if the key is absent or persistent.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let sets = self.sets.read();
        let entry = sets.get(key).filter(|entry| !entry.is_expired(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }

    /// Every live key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let sets = self.sets.read();
        let mut keys: Vec<String> = sets
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Whether the key currently exists.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.sets
            .read()
            .get(key)
            .map_or(false, |entry| !entry.is_expired(now))
    }

    /// Number of stored sets, counting expired ones not yet swept.
    pub fn stored_key_count(&self) -> usize {
        self.sets.read().len()
    }

    /// Drop every expired set. Runs under the write lock of each write, so
    /// past slot boards are released even though nothing writes them again.
    fn purge_expired(sets: &mut HashMap<String, Entry>) {
        let now = Instant::now();
        let before = sets.len();
        sets.retain(|_, entry| !entry.is_expired(now));
        let swept = before - sets.len();
        if swept > 0 {
            debug!(swept = swept, "Expired sets swept");
        }
    }

    fn with_live<T>(&self, key: &str, f: impl FnOnce(Option<&Entry>) -> T) -> T {
        let now = Instant::now();
        let sets = self.sets.read();
        f(sets.get(key).filter(|entry| !entry.is_expired(now)))
    }
}

#[async_trait]
impl OrderedSetStore for InMemoryOrderedSetStore {
    async fn add_or_update_score(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut sets = self.sets.write();
        Self::purge_expired(&mut sets);
        sets.entry(key.to_string())
            .or_default()
            .scores
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn increment_score(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        let mut sets = self.sets.write();
        Self::purge_expired(&mut sets);
        let score = sets
            .entry(key.to_string())
            .or_default()
            .scores
            .entry(member.to_string())
            .or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        order: SortOrder,
    ) -> Result<Vec<ScoredMember>> {
        Ok(self.with_live(key, |entry| {
            let Some(entry) = entry else {
                return Vec::new();
            };
            let sorted = entry.sorted(order);
            match normalize_bounds(start, stop, sorted.len()) {
                Some((start, stop)) => sorted[start..=stop].to_vec(),
                None => Vec::new(),
            }
        }))
    }

    async fn rank(&self, key: &str, member: &str, order: SortOrder) -> Result<Option<u64>> {
        Ok(self.with_live(key, |entry| {
            let entry = entry?;
            entry
                .sorted(order)
                .iter()
                .position(|scored| scored.member == member)
                .map(|position| position as u64)
        }))
    }

    async fn cardinality(&self, key: &str) -> Result<u64> {
        Ok(self.with_live(key, |entry| {
            entry.map_or(0, |entry| entry.scores.len() as u64)
        }))
    }

    #[instrument(skip(self))]
    async fn intersect_into(&self, dest: &str, keys: &[&str]) -> Result<u64> {
        let mut sets = self.sets.write();
        Self::purge_expired(&mut sets);

        let mut result: Option<HashMap<String, f64>> = None;
        for key in keys {
            let scores = sets.get(*key).map(|entry| &entry.scores);
            let Some(scores) = scores else {
                result = Some(HashMap::new());
                break;
            };
            result = Some(match result {
                None => scores.clone(),
                Some(acc) => acc
                    .into_iter()
                    .filter_map(|(member, score)| {
                        scores.get(&member).map(|other| (member, score + other))
                    })
                    .collect(),
            });
        }

        let scores = result.unwrap_or_default();
        let count = scores.len() as u64;
        if scores.is_empty() {
            sets.remove(dest);
        } else {
            sets.insert(
                dest.to_string(),
                Entry {
                    scores,
                    expires_at: None,
                },
            );
        }

        debug!(dest = %dest, count = count, "Intersection stored");
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut sets = self.sets.write();
        Self::purge_expired(&mut sets);
        match sets.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut sets = self.sets.write();
        Self::purge_expired(&mut sets);
        Ok(sets.remove(key).is_some())
    }

    async fn add_members(&self, key: &str, members: &[String], score: f64) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let mut sets = self.sets.write();
        Self::purge_expired(&mut sets);
        let entry = sets.entry(key.to_string()).or_default();
        for member in members {
            entry.scores.insert(member.clone(), score);
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<StoreHealthStatus> {
        Ok(StoreHealthStatus {
            healthy: true,
            latency: Duration::ZERO,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(key: &str, members: &[(&str, f64)]) -> InMemoryOrderedSetStore {
        let store = InMemoryOrderedSetStore::new();
        for (member, score) in members {
            store.add_or_update_score(key, member, *score).await.unwrap();
        }
        store
    }

    fn names(members: &[ScoredMember]) -> Vec<&str> {
        members.iter().map(|m| m.member.as_str()).collect()
    }

    #[test]
    fn test_normalize_bounds() {
        assert_eq!(normalize_bounds(0, -1, 5), Some((0, 4)));
        assert_eq!(normalize_bounds(-2, -1, 5), Some((3, 4)));
        assert_eq!(normalize_bounds(-10, 2, 5), Some((0, 2)));
        assert_eq!(normalize_bounds(3, 100, 5), Some((3, 4)));
        assert_eq!(normalize_bounds(5, 10, 5), None);
        assert_eq!(normalize_bounds(3, 1, 5), None);
        assert_eq!(normalize_bounds(0, -1, 0), None);
    }

    #[tokio::test]
    async fn test_range_orders_by_score_then_member() {
        let store = seeded("k", &[("b", 2.0), ("a", 2.0), ("c", 1.0)]).await;

        let asc = store.range_by_rank("k", 0, -1, SortOrder::Ascending).await.unwrap();
        assert_eq!(names(&asc), vec!["c", "a", "b"]);

        let desc = store.range_by_rank("k", 0, -1, SortOrder::Descending).await.unwrap();
        assert_eq!(names(&desc), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_range_negative_and_out_of_bounds() {
        let store = seeded("k", &[("a", 1.0), ("b", 2.0), ("c", 3.0)]).await;

        let tail = store.range_by_rank("k", -2, -1, SortOrder::Ascending).await.unwrap();
        assert_eq!(names(&tail), vec!["b", "c"]);

        let past_end = store.range_by_rank("k", 5, 9, SortOrder::Ascending).await.unwrap();
        assert!(past_end.is_empty());

        let missing = store.range_by_rank("nope", 0, -1, SortOrder::Ascending).await.unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_rank_and_cardinality() {
        let store = seeded("k", &[("a", 1.0), ("b", 2.0), ("c", 3.0)]).await;

        assert_eq!(store.rank("k", "a", SortOrder::Ascending).await.unwrap(), Some(0));
        assert_eq!(store.rank("k", "a", SortOrder::Descending).await.unwrap(), Some(2));
        assert_eq!(store.rank("k", "zz", SortOrder::Ascending).await.unwrap(), None);
        assert_eq!(store.cardinality("k").await.unwrap(), 3);
        assert_eq!(store.cardinality("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_creates_and_sums() {
        let store = InMemoryOrderedSetStore::new();
        assert_eq!(store.increment_score("k", "a", 3.0).await.unwrap(), 3.0);
        assert_eq!(store.increment_score("k", "a", 4.5).await.unwrap(), 7.5);
    }

    #[tokio::test]
    async fn test_intersect_sums_scores_and_overwrites_dest() {
        let store = seeded("board", &[("a", 5.0), ("b", 6.0), ("c", 7.0)]).await;
        store
            .add_members("friends", &["a".to_string(), "c".to_string(), "x".to_string()], 0.0)
            .await
            .unwrap();
        store.add_or_update_score("dest", "stale", 1.0).await.unwrap();
        store.expire("dest", Duration::from_secs(60)).await.unwrap();

        let count = store.intersect_into("dest", &["friends", "board"]).await.unwrap();
        assert_eq!(count, 2);

        let members = store.range_by_rank("dest", 0, -1, SortOrder::Ascending).await.unwrap();
        assert_eq!(members, vec![ScoredMember::new("a", 5.0), ScoredMember::new("c", 7.0)]);
        assert_eq!(store.ttl("dest"), None);
    }

    #[tokio::test]
    async fn test_intersect_with_missing_key_removes_dest() {
        let store = seeded("board", &[("a", 5.0)]).await;
        store.add_or_update_score("dest", "stale", 1.0).await.unwrap();

        let count = store.intersect_into("dest", &["missing", "board"]).await.unwrap();
        assert_eq!(count, 0);
        assert!(!store.contains_key("dest"));
    }

    #[tokio::test]
    async fn test_delete_and_expire_missing_key() {
        let store = seeded("k", &[("a", 1.0)]).await;
        assert!(!store.expire("nope", Duration::from_secs(1)).await.unwrap());
        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_add_members_empty_is_noop() {
        let store = InMemoryOrderedSetStore::new();
        store.add_members("k", &[], 0.0).await.unwrap();
        assert!(!store.contains_key("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_keys_disappear() {
        let store = seeded("k", &[("a", 1.0)]).await;
        assert!(store.expire("k", Duration::from_secs(10)).await.unwrap());
        assert_eq!(store.ttl("k"), Some(Duration::from_secs(10)));

        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(store.cardinality("k").await.unwrap(), 0);
        assert!(store.keys().is_empty());

        store.add_or_update_score("k", "b", 2.0).await.unwrap();
        let members = store.range_by_rank("k", 0, -1, SortOrder::Ascending).await.unwrap();
        assert_eq!(names(&members), vec!["b"]);
        assert_eq!(store.ttl("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_other_expired_keys() {
        let store = seeded("leaders/g/m/d/20130206", &[("a", 1.0)]).await;
        store
            .expire("leaders/g/m/d/20130206", Duration::from_secs(10))
            .await
            .unwrap();
        store.add_or_update_score("leaders/g/m/a/a", "a", 1.0).await.unwrap();
        assert_eq!(store.stored_key_count(), 2);

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.stored_key_count(), 2);

        store.add_or_update_score("leaders/g/m/d/20130207", "a", 1.0).await.unwrap();
        assert_eq!(store.stored_key_count(), 2);
        assert_eq!(
            store.keys(),
            vec!["leaders/g/m/a/a".to_string(), "leaders/g/m/d/20130207".to_string()]
        );
    }
}
