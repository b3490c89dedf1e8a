//! HTTP route handlers.

pub mod health;
pub mod leaderboards;

// Re-export for convenience
pub use health::routes as health_routes;
pub use leaderboards::routes as leaderboard_routes;
