//! Common utilities and shared functionality for the leaderboard service.
//!
//! This crate provides foundational utilities used across all crates:
//! - Configuration management
//! - Telemetry and structured logging
//! - DateTime operations

pub mod config;
pub mod datetime;
pub mod telemetry;

// Re-export commonly used types
pub use config::{
    AppConfig, ExpirationOverrides, LeaderboardSettings, ServerConfig, StoreConfig, StoreProvider,
    TelemetryConfig,
};
pub use datetime::{format_datetime, from_unix_seconds, now_utc, parse_datetime};
pub use telemetry::{init_tracing, LogFormat};

/// Common error type used throughout the crate
pub type Result<T> = std::result::Result<T, anyhow::Error>;
