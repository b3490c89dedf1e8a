//! Leaderboard REST API
//!
//! This crate exposes the leaderboard engine over HTTP with Axum.
//!
//! ## Architecture
//!
//! The API is organized into the following modules:
//!
//! - **app**: Router assembly and middleware stack
//! - **state**: Shared state (configuration, store handle, clock)
//! - **routes**: HTTP route handlers (leaderboards, health)
//! - **middleware**: Request ID and request logging middleware
//! - **responses**: Standardized response envelope
//! - **error**: HTTP error handling and conversion
//!
//! ## Usage
//!
//! ```rust,no_run
//! use leaders_api_rest::{create_app, AppState};
//! use leaders_common::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     let address = config.server_address();
//!     let state = AppState::from_config(config).await?;
//!     let app = create_app(state);
//!
//!     let listener = tokio::net::TcpListener::bind(address).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod error;
pub mod middleware;
pub mod responses;
pub mod routes;
pub mod state;

// Re-export commonly used types
pub use app::create_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
