//! Leaders Domain Types
//!
//! This crate provides the core domain model for the leaderboard service:
//! rolling time windows, board key derivation, sort direction and the ranked
//! result records returned to callers.
//!
//! ## Architecture
//!
//! The domain layer is organized into the following modules:
//!
//! - **time_range**: Daily, weekly, monthly and all-time bucketing schemes
//! - **board**: Board key derivation and sort direction
//! - **leader**: Ranked result records (`Leader`, `LeadersResult`)
//! - **clock**: Wall-clock abstraction used for slot derivation
//!
//! ## Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use leaders_domain::{board_key, TimeRange};
//!
//! let now = Utc.with_ymd_and_hms(2013, 2, 7, 12, 0, 0).unwrap();
//! let slot = TimeRange::DAILY.slot_key(0, now).unwrap();
//! assert_eq!(board_key("combat", "highscore", &slot), "leaders/combat/highscore/d/20130207");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod board;
pub mod clock;
pub mod leader;
pub mod time_range;

// Re-export commonly used types
pub use board::{board_key, SortOrder, BOARD_KEY_ROOT};
pub use clock::{Clock, SystemClock};
pub use leader::{Leader, LeadersResult};
pub use time_range::{RangeKind, TimeRange, TimeRangeError, Window, KEY_DELIMITER};
