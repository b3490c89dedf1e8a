//! Testing utilities for the leaderboard service
//!
//! This crate provides:
//! - A settable [`FixedClock`] for deterministic slot derivation
//! - A fault-injecting store wrapper ([`FailingStore`]) for teardown tests
//! - Fixtures for the canonical player boards and friends lists
//! - A builder for seeding raw sorted sets
//!
//! # Examples
//!
//! ```
//! use leaders_testing::{fixtures::*, FixedClock};
//! use leaders_domain::Clock;
//!
//! let clock = FixedClock::new(reference_instant());
//! assert_eq!(clock.now(), reference_instant());
//! assert_eq!(player_scores(20).len(), 20);
//! ```

pub mod builders;
pub mod clock;
pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use builders::*;
pub use clock::FixedClock;
pub use fixtures::*;
pub use mocks::*;

// Re-export testing dependencies for convenience
pub use proptest;
