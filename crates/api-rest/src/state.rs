//! Application state and dependency injection.
//!
//! The state carries the store handle every request's leaderboard is built
//! on. Leaderboards themselves are cheap and built per request from the
//! path's game and metric.

use anyhow::Context;
use leaders_application::{Leaderboard, LeaderboardResult};
use leaders_common::{AppConfig, StoreProvider};
use leaders_domain::{Clock, SystemClock, TimeRange};
use leaders_infrastructure::{
    InMemoryOrderedSetStore, OrderedSetStore, RedisOrderedSetStore, RedisStoreConfig,
};
use std::sync::Arc;
use tracing::info;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Ordered-set store backing every board
    pub store: Arc<dyn OrderedSetStore>,

    /// Clock used for slot derivation
    pub clock: Arc<dyn Clock>,

    ranges: Arc<Vec<TimeRange>>,
}

impl AppState {
    /// Create state over an existing store handle.
    pub fn new(config: AppConfig, store: Arc<dyn OrderedSetStore>) -> anyhow::Result<Self> {
        let ranges = config.leaderboard.time_ranges()?;
        Ok(Self {
            config: Arc::new(config),
            store,
            clock: Arc::new(SystemClock),
            ranges: Arc::new(ranges),
        })
    }

    /// Connect the configured store and create state over it.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn OrderedSetStore> = match config.store.provider {
            StoreProvider::Redis => {
                let store = RedisOrderedSetStore::connect(RedisStoreConfig::from(&config.store))
                    .await
                    .context("Failed to connect to Redis store")?;
                Arc::new(store)
            }
            StoreProvider::InMemory => {
                info!("Using in-memory store; boards are lost on restart");
                Arc::new(InMemoryOrderedSetStore::new())
            }
        };

        Self::new(config, store)
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured time ranges.
    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    /// Build the leaderboard for one game and metric.
    pub fn leaderboard(&self, game: &str, metric: &str) -> LeaderboardResult<Leaderboard> {
        let settings = &self.config.leaderboard;
        Leaderboard::builder(game, metric)
            .ranges(self.ranges.iter().copied())
            .reverse(settings.reverse)
            .timed_ties(settings.timed_ties)
            .tie_oldest_wins(settings.tie_oldest_wins)
            .store(Arc::clone(&self.store))
            .clock(Arc::clone(&self.clock))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_in_memory() {
        let state = AppState::from_config(AppConfig::development()).await.unwrap();
        assert_eq!(state.ranges().len(), 4);

        let board = state.leaderboard("combat", "highscore").unwrap();
        assert!(board.config().reverse);
    }

    #[test]
    fn test_ranges_follow_config() {
        let mut config = AppConfig::development();
        config.leaderboard.ranges = vec!["d".to_string(), "a".to_string()];
        let state = AppState::new(config, Arc::new(InMemoryOrderedSetStore::new())).unwrap();
        assert_eq!(state.ranges(), &[TimeRange::DAILY, TimeRange::ALL_TIME]);
    }
}
