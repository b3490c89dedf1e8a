//! Application layer for the leaderboard service
//!
//! This crate holds the ranking engine that sits on top of the ordered-set
//! store: board key derivation per time window, tie-break score encoding,
//! rank assignment and friends-filtered retrieval.
//!
//! ## Modules
//!
//! - `codec` - Packs a tie-break timestamp into the fractional part of a score
//! - `ranks` - Turns an ordered store slice into ranked `Leader` records
//! - `leaderboard` - The `Leaderboard` engine and its friends-list filter

pub mod codec;
pub mod leaderboard;
pub mod ranks;

// Re-export commonly used types
pub use codec::{ScoreCodec, TIE_BREAK_PIVOT, TIE_BREAK_VALUE_CEILING};
pub use leaderboard::{
    EphemeralKey, Leaderboard, LeaderboardBuilder, LeaderboardConfig, LeadersQuery,
};
pub use ranks::RankAssigner;

use leaders_domain::TimeRangeError;
use thiserror::Error;

/// Errors raised by leaderboard operations
#[derive(Error, Debug)]
pub enum LeaderboardError {
    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A range code with no configured time range
    #[error("Unknown range: {0}")]
    UnknownRange(String),

    /// Backing store failure
    #[error("Store failure: {0}")]
    Store(#[from] leaders_infrastructure::Error),
}

impl LeaderboardError {
    /// Get HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            LeaderboardError::InvalidInput(_) => 400,
            LeaderboardError::UnknownRange(_) => 400,
            LeaderboardError::Store(_) => 503,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LeaderboardError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            LeaderboardError::InvalidInput(_) => "INVALID_INPUT",
            LeaderboardError::UnknownRange(_) => "UNKNOWN_RANGE",
            LeaderboardError::Store(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<TimeRangeError> for LeaderboardError {
    fn from(err: TimeRangeError) -> Self {
        LeaderboardError::InvalidInput(err.to_string())
    }
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
