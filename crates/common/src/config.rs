//! Configuration management for the leaderboard service.
//!
//! This module provides a centralized configuration system that loads settings
//! from configuration files and environment variables.
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//!
//! [store]
//! provider = "redis"
//! url = "redis://localhost:6379"
//!
//! [leaderboard]
//! ranges = ["d", "w", "m", "a"]
//! reverse = true
//! timed_ties = false
//! tie_oldest_wins = true
//!
//! [leaderboard.expirations]
//! daily_seconds = 259200
//! ```

use anyhow::{Context, Result};
use leaders_domain::{RangeKind, TimeRange};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Ordered-set store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging settings
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Board family defaults applied to every (game, metric)
    #[serde(default)]
    pub leaderboard: LeaderboardSettings,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Which ordered-set store backs the boards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreProvider {
    /// Redis sorted sets
    #[default]
    Redis,
    /// Process-local sorted sets, for development and tests
    InMemory,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend
    #[serde(default)]
    pub provider: StoreProvider,

    /// Redis connection URL
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name reported in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable JSON logging format
    #[serde(default)]
    pub json_logging: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Defaults for the boards created by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSettings {
    /// Range codes written on every score update
    #[serde(default = "default_ranges")]
    pub ranges: Vec<String>,

    /// Highest score ranks first
    #[serde(default = "default_true")]
    pub reverse: bool,

    /// Break ties by timestamp instead of member id
    #[serde(default)]
    pub timed_ties: bool,

    /// Earlier timestamps win ties
    #[serde(default = "default_true")]
    pub tie_oldest_wins: bool,

    /// TTL overrides per range
    #[serde(default)]
    pub expirations: ExpirationOverrides,
}

/// Optional TTL overrides, in seconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpirationOverrides {
    /// Daily board TTL
    pub daily_seconds: Option<u64>,
    /// Weekly board TTL
    pub weekly_seconds: Option<u64>,
    /// Monthly board TTL
    pub monthly_seconds: Option<u64>,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_service_name() -> String {
    "leaders".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ranges() -> Vec<String> {
    TimeRange::ALL.iter().map(|r| r.code().to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreProvider::default(),
            url: default_redis_url(),
            connection_timeout_seconds: default_connection_timeout(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            json_logging: false,
            log_level: default_log_level(),
        }
    }
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            ranges: default_ranges(),
            reverse: true,
            timed_ties: false,
            tie_oldest_wins: true,
            expirations: ExpirationOverrides::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from configuration files and environment variables.
    ///
    /// The configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/{environment}.toml (if exists, where environment is from APP_ENV)
    /// 4. Environment variables (prefixed with APP__)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use leaders_common::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load configuration");
    /// println!("Server will run on {}:{}", config.server.host, config.server.port);
    /// ```
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`AppConfig::load`], with an extra file applied after the
    /// environment-specific one.
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Example: APP__SERVER__PORT=3000, APP__LEADERBOARD__RANGES=d,a
        let config = builder
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("leaderboard.ranges")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.store.provider == StoreProvider::Redis && self.store.url.is_empty() {
            anyhow::bail!("Redis URL is required");
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level '{}'. Must be one of: {}",
                self.telemetry.log_level,
                valid_log_levels.join(", ")
            );
        }

        if self.leaderboard.ranges.is_empty() {
            anyhow::bail!("At least one leaderboard range is required");
        }

        let expirations = &self.leaderboard.expirations;
        for (name, seconds) in [
            ("daily", expirations.daily_seconds),
            ("weekly", expirations.weekly_seconds),
            ("monthly", expirations.monthly_seconds),
        ] {
            if seconds == Some(0) {
                anyhow::bail!("The {} board expiration must be greater than 0 seconds", name);
            }
        }

        self.leaderboard.time_ranges()?;

        Ok(())
    }

    /// Get the store connection timeout as a Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.store.connection_timeout_seconds)
    }

    /// Get the request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    /// Get server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Create a development configuration backed by the in-memory store
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                ..ServerConfig::default()
            },
            store: StoreConfig {
                provider: StoreProvider::InMemory,
                ..StoreConfig::default()
            },
            telemetry: TelemetryConfig {
                service_name: "leaders-dev".to_string(),
                json_logging: false,
                log_level: "debug".to_string(),
            },
            leaderboard: LeaderboardSettings::default(),
        }
    }
}

impl LeaderboardSettings {
    /// Resolve the configured range codes, applying TTL overrides.
    pub fn time_ranges(&self) -> Result<Vec<TimeRange>> {
        self.ranges
            .iter()
            .map(|code| {
                let range = TimeRange::from_code(code)
                    .with_context(|| format!("Unknown leaderboard range code '{}'", code))?;
                let ttl = match range.kind() {
                    RangeKind::Daily => self.expirations.daily_seconds,
                    RangeKind::Weekly => self.expirations.weekly_seconds,
                    RangeKind::Monthly => self.expirations.monthly_seconds,
                    RangeKind::AllTime => None,
                };
                Ok(match ttl {
                    Some(secs) => range.with_expiration(Duration::from_secs(secs)),
                    None => range,
                })
            })
            .collect()
    }
}
