//! Store module - ordered-set store contract and Redis provider
//!
//! Boards live in sorted sets. The engine only talks to the
//! [`OrderedSetStore`] trait, so the Redis provider below and the in-memory
//! provider in [`crate::memory`] are interchangeable.

use async_trait::async_trait;
use leaders_common::StoreConfig;
use leaders_domain::SortOrder;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::{Error, Result};

/// A member of a sorted set together with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMember {
    /// Member identifier
    pub member: String,
    /// Raw stored score
    pub score: f64,
}

impl ScoredMember {
    /// Create a scored member.
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

impl From<(String, f64)> for ScoredMember {
    fn from((member, score): (String, f64)) -> Self {
        Self { member, score }
    }
}

/// Store health status.
#[derive(Debug, Clone)]
pub struct StoreHealthStatus {
    /// Whether the store is healthy
    pub healthy: bool,
    /// PING latency
    pub latency: Duration,
    /// Error message if unhealthy
    pub error: Option<String>,
}

/// Operations the leaderboard engine needs from an ordered-set store.
///
/// Every call is a single store command (or one pipelined batch); nothing
/// here spans multiple round trips atomically.
#[async_trait]
pub trait OrderedSetStore: Send + Sync {
    /// Set the member's score, overwriting any previous score.
    async fn add_or_update_score(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// Add `delta` to the member's score, creating it at `delta` if absent.
    /// Returns the new score.
    async fn increment_score(&self, key: &str, member: &str, delta: f64) -> Result<f64>;

    /// Members between ranks `start` and `stop` inclusive, in the given order.
    /// Negative indices count from the end, so `stop = -1` means the last member.
    async fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        order: SortOrder,
    ) -> Result<Vec<ScoredMember>>;

    /// 0-based position of the member in the given order.
    async fn rank(&self, key: &str, member: &str, order: SortOrder) -> Result<Option<u64>>;

    /// Number of members in the set, 0 for absent keys.
    async fn cardinality(&self, key: &str) -> Result<u64>;

    /// Store the intersection of `keys` in `dest`, summing scores.
    /// Returns the number of members in `dest`.
    async fn intersect_into(&self, dest: &str, keys: &[&str]) -> Result<u64>;

    /// Set a TTL on the key. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Delete the key. Returns false if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Add every member with the same score in one atomic batch.
    async fn add_members(&self, key: &str, members: &[String], score: f64) -> Result<()>;

    /// Check that the store answers.
    async fn health_check(&self) -> Result<StoreHealthStatus>;
}

/// Redis store configuration.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (redis://host:port)
    pub url: String,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&StoreConfig> for RedisStoreConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            url: config.url.clone(),
            connection_timeout: Duration::from_secs(config.connection_timeout_seconds),
        }
    }
}

/// Redis-backed ordered-set store.
#[derive(Clone)]
pub struct RedisOrderedSetStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl RedisOrderedSetStore {
    /// Connect to Redis.
    #[instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: RedisStoreConfig) -> Result<Self> {
        info!("Connecting to Redis store");

        let client = Client::open(config.url.clone())
            .map_err(|e| Error::Configuration(format!("invalid Redis URL: {}", e)))?;

        let connection = tokio::time::timeout(
            config.connection_timeout,
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| Error::Timeout(format!("connecting to {}", config.url)))??;

        info!("Redis store connected successfully");
        Ok(Self { connection, config })
    }

    /// Get a connection manager clone for concurrent operations.
    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl OrderedSetStore for RedisOrderedSetStore {
    #[instrument(skip(self))]
    async fn add_or_update_score(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut conn = self.conn();
        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn increment_score(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        let mut conn = self.conn();
        let score: f64 = conn.zincr(key, member, delta).await?;
        Ok(score)
    }

    #[instrument(skip(self))]
    async fn range_by_rank(
        &self,
        key: &str,
        start: i64,
        stop: i64,
        order: SortOrder,
    ) -> Result<Vec<ScoredMember>> {
        let mut conn = self.conn();
        let (start, stop) = (start as isize, stop as isize);

        let members: Vec<(String, f64)> = match order {
            SortOrder::Ascending => conn.zrange_withscores(key, start, stop).await?,
            SortOrder::Descending => conn.zrevrange_withscores(key, start, stop).await?,
        };

        debug!(key = %key, count = members.len(), "Range fetched");
        Ok(members.into_iter().map(ScoredMember::from).collect())
    }

    #[instrument(skip(self))]
    async fn rank(&self, key: &str, member: &str, order: SortOrder) -> Result<Option<u64>> {
        let mut conn = self.conn();
        let rank: Option<u64> = match order {
            SortOrder::Ascending => conn.zrank(key, member).await?,
            SortOrder::Descending => conn.zrevrank(key, member).await?,
        };
        Ok(rank)
    }

    #[instrument(skip(self))]
    async fn cardinality(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn();
        let count: u64 = conn.zcard(key).await?;
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn intersect_into(&self, dest: &str, keys: &[&str]) -> Result<u64> {
        let mut conn = self.conn();
        let count: u64 = conn.zinterstore(dest, keys).await?;
        debug!(dest = %dest, count = count, "Intersection stored");
        Ok(count)
    }

    #[instrument(skip(self))]
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn();
        let applied: bool = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs())
            .query_async(&mut conn)
            .await?;
        Ok(applied)
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn();
        let deleted: u64 = conn.del(key).await?;
        debug!(key = %key, deleted = deleted > 0, "Key delete");
        Ok(deleted > 0)
    }

    #[instrument(skip(self, members), fields(count = members.len()))]
    async fn add_members(&self, key: &str, members: &[String], score: f64) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for member in members {
            pipe.zadd(key, member, score).ignore();
        }

        let mut conn = self.conn();
        pipe.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<StoreHealthStatus> {
        let start = std::time::Instant::now();

        let mut conn = self.conn();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(response) if response == "PONG" => {
                let latency = start.elapsed();
                debug!(latency_ms = latency.as_millis(), "Store health check passed");
                Ok(StoreHealthStatus {
                    healthy: true,
                    latency,
                    error: None,
                })
            }
            Ok(response) => Ok(StoreHealthStatus {
                healthy: false,
                latency: start.elapsed(),
                error: Some(format!("Unexpected PING response: {}", response)),
            }),
            Err(e) => {
                warn!(error = %e, "Store health check failed");
                Ok(StoreHealthStatus {
                    healthy: false,
                    latency: start.elapsed(),
                    error: Some(e.to_string()),
                })
            }
        }
    }
}

impl std::fmt::Debug for RedisOrderedSetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisOrderedSetStore")
            .field("config", &self.config)
            .finish()
    }
}
