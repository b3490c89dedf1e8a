//! Infrastructure layer for the leaderboard service
//!
//! This crate provides the ordered-set store the leaderboard engine runs on:
//! - The [`OrderedSetStore`] contract
//! - A Redis provider built on a multiplexed `ConnectionManager`
//! - An in-memory provider with identical ordering semantics, used for
//!   development and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use leaders_infrastructure::{OrderedSetStore, RedisOrderedSetStore, RedisStoreConfig};
//!
//! let store = RedisOrderedSetStore::connect(RedisStoreConfig::default()).await?;
//! store.add_or_update_score("leaders/combat/highscore/a/a", "player1", 10.0).await?;
//! ```

pub mod memory;
pub mod store;

// Re-export commonly used types
pub use memory::InMemoryOrderedSetStore;
pub use store::{
    OrderedSetStore, RedisOrderedSetStore, RedisStoreConfig, ScoredMember, StoreHealthStatus,
};

// Re-export result and error types
pub type Result<T> = std::result::Result<T, Error>;

/// Infrastructure-level errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command errors from Redis
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// Timeout errors
    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Error {
    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Store(_) | Error::Connection(_) | Error::Timeout(_)
        )
    }

    /// Get HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Configuration(_) => 500,
            Error::Store(_) | Error::Connection(_) | Error::Timeout(_) => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let timeout = Error::Timeout("zadd".to_string());
        assert!(timeout.is_retryable());

        let config = Error::Configuration("bad url".to_string());
        assert!(!config.is_retryable());
    }

    #[test]
    fn test_error_http_status() {
        let connection = Error::Connection("refused".to_string());
        assert_eq!(connection.http_status(), 503);

        let config = Error::Configuration("bad config".to_string());
        assert_eq!(config.http_status(), 500);
    }
}
