//! Friends-filtered leaderboards
//!
//! A friends query writes the friend ids into a temporary set, intersects it
//! with the board into a second temporary set, and reads the ranked slice
//! from the intersection. Both temporary keys are owned by an
//! [`EphemeralKey`] guard so they are deleted on every exit path.

use chrono::{DateTime, Utc};
use leaders_domain::{LeadersResult, TimeRange};
use leaders_infrastructure::OrderedSetStore;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{Leaderboard, LeadersQuery};
use crate::{LeaderboardError, LeaderboardResult};

static FRIENDS_KEY_SALT: AtomicU64 = AtomicU64::new(0);

/// A store key that must not outlive the operation that created it.
///
/// Call [`EphemeralKey::release`] on normal exits. If the guard is dropped
/// unreleased (a cancelled future, a panic) the delete is spawned onto the
/// current Tokio runtime instead.
pub struct EphemeralKey {
    store: Arc<dyn OrderedSetStore>,
    key: String,
    released: bool,
}

impl EphemeralKey {
    pub fn new(store: Arc<dyn OrderedSetStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            released: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Delete the key now. Returns whether it existed.
    pub async fn release(mut self) -> leaders_infrastructure::Result<bool> {
        self.released = true;
        let deleted = self.store.delete(&self.key).await?;
        debug!(key = %self.key, deleted = deleted, "Ephemeral key released");
        Ok(deleted)
    }
}

impl Drop for EphemeralKey {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let key = std::mem::take(&mut self.key);
        let store = Arc::clone(&self.store);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.delete(&key).await {
                        warn!(key = %key, error = %e, "Failed to delete abandoned ephemeral key");
                    }
                });
            }
            Err(_) => warn!(key = %key, "No runtime available to delete ephemeral key"),
        }
    }
}

impl std::fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKey")
            .field("key", &self.key)
            .field("released", &self.released)
            .finish()
    }
}

/// Unique key for a temporary friends set: a digest of the ids salted with
/// the time and a process-wide counter.
fn friends_key(friends: &[String], now: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    for friend in friends {
        hasher.update(friend.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(now.timestamp().to_be_bytes());
    hasher.update(now.timestamp_subsec_nanos().to_be_bytes());
    hasher.update(FRIENDS_KEY_SALT.fetch_add(1, Ordering::Relaxed).to_be_bytes());
    format!("friends_{}", hex::encode(hasher.finalize()))
}

fn intersection_key(friends_key: &str, board_key: &str) -> String {
    format!("inter_{}_{}", friends_key, board_key)
}

/// Combine an operation's outcome with its cleanup. The operation's own
/// error wins; a cleanup failure after a successful operation is reported.
fn settle<T>(
    outcome: LeaderboardResult<T>,
    cleanup: leaders_infrastructure::Result<bool>,
) -> LeaderboardResult<T> {
    match (outcome, cleanup) {
        (Ok(value), Ok(_)) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(_)) => Err(e),
        (Err(e), Err(cleanup)) => {
            warn!(error = %cleanup, "Ephemeral key cleanup failed after query error");
            Err(e)
        }
    }
}

fn reject_centering(query: &LeadersQuery) -> LeaderboardResult<()> {
    if query.center_on.is_some() {
        return Err(LeaderboardError::InvalidInput(
            "centering is not supported for friends queries".to_string(),
        ));
    }
    Ok(())
}

impl Leaderboard {
    /// Ranked slice of one board restricted to `friends`.
    ///
    /// Ranks are positions among the friends who scored, not global ranks.
    /// Friends who never scored are left out.
    #[instrument(skip(self, friends), fields(game = %self.config().game, friends = friends.len()))]
    pub async fn leaders_friends_list(
        &self,
        friends: &[String],
        range: &TimeRange,
        query: &LeadersQuery,
    ) -> LeaderboardResult<LeadersResult> {
        reject_centering(query)?;
        let now = self.now();

        if friends.is_empty() {
            let window = range.window_bounds(query.slots_ago, now)?;
            return Ok(LeadersResult {
                total: 0,
                window_start: window.start,
                window_end: window.end,
                leaders: Vec::new(),
            });
        }

        let guard = EphemeralKey::new(Arc::clone(self.store()), friends_key(friends, now));
        let outcome = match self.store().add_members(guard.key(), friends, 0.0).await {
            Ok(()) => self.leaders_friends_key(guard.key(), range, query).await,
            Err(e) => Err(e.into()),
        };

        settle(outcome, guard.release().await)
    }

    /// Ranked slice of one board restricted to the members of the set stored
    /// at `friends_key`. Scores are read without tie-break decoding.
    #[instrument(skip(self), fields(game = %self.config().game))]
    pub async fn leaders_friends_key(
        &self,
        friends_key: &str,
        range: &TimeRange,
        query: &LeadersQuery,
    ) -> LeaderboardResult<LeadersResult> {
        reject_centering(query)?;
        let now = self.now();
        let board_key = self.board_key_at(range, query.slots_ago, now)?;
        let window = range.window_bounds(query.slots_ago, now)?;

        let guard = EphemeralKey::new(
            Arc::clone(self.store()),
            intersection_key(friends_key, &board_key),
        );
        let outcome = self
            .intersect_and_rank(guard.key(), &board_key, friends_key, query)
            .await;
        let (total, leaders) = settle(outcome, guard.release().await)?;

        Ok(LeadersResult {
            total,
            window_start: window.start,
            window_end: window.end,
            leaders,
        })
    }

    async fn intersect_and_rank(
        &self,
        inter_key: &str,
        board_key: &str,
        friends_key: &str,
        query: &LeadersQuery,
    ) -> LeaderboardResult<(u64, Vec<leaders_domain::Leader>)> {
        let count = self
            .store()
            .intersect_into(inter_key, &[board_key, friends_key])
            .await?;
        debug!(inter_key = %inter_key, count = count, "Friends intersected with board");

        let end = query.end_index(query.offset);
        self.ranked_slice(inter_key, query.offset, end, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use leaders_infrastructure::InMemoryOrderedSetStore;

    #[test]
    fn test_friends_key_shape() {
        let now = Utc.with_ymd_and_hms(2013, 2, 7, 12, 0, 0).unwrap();
        let key = friends_key(&["a".to_string(), "b".to_string()], now);
        assert!(key.starts_with("friends_"));
        assert_eq!(key.len(), "friends_".len() + 64);
        assert!(key["friends_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_friends_key_unique_per_call() {
        let now = Utc.with_ymd_and_hms(2013, 2, 7, 12, 0, 0).unwrap();
        let friends = vec!["a".to_string()];
        assert_ne!(friends_key(&friends, now), friends_key(&friends, now));
    }

    #[test]
    fn test_intersection_key() {
        assert_eq!(
            intersection_key("friends_ab", "leaders/g/m/d/20130207"),
            "inter_friends_ab_leaders/g/m/d/20130207"
        );
    }

    #[test]
    fn test_settle_prefers_operation_error() {
        let outcome: LeaderboardResult<()> =
            Err(LeaderboardError::InvalidInput("query".to_string()));
        let cleanup = Err(leaders_infrastructure::Error::Timeout("del".to_string()));
        assert!(matches!(
            settle(outcome, cleanup),
            Err(LeaderboardError::InvalidInput(_))
        ));

        let cleanup = Err(leaders_infrastructure::Error::Timeout("del".to_string()));
        assert!(matches!(settle(Ok(()), cleanup), Err(LeaderboardError::Store(_))));
    }

    #[tokio::test]
    async fn test_release_deletes_key() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        store.add_or_update_score("tmp", "a", 0.0).await.unwrap();

        let guard = EphemeralKey::new(store.clone(), "tmp");
        assert!(guard.release().await.unwrap());
        assert!(!store.contains_key("tmp"));
    }

    #[tokio::test]
    async fn test_drop_spawns_delete() {
        let store = Arc::new(InMemoryOrderedSetStore::new());
        store.add_or_update_score("tmp", "a", 0.0).await.unwrap();

        drop(EphemeralKey::new(store.clone(), "tmp"));
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(!store.contains_key("tmp"));
    }
}
