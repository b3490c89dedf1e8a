//! Leaderboard endpoints.
//!
//! - `POST /:game/:metric/:member` records a value for the member on every
//!   configured range
//! - `GET /:game/:metric/:range_code` returns the ranked board
//! - `GET /:game/:metric/:member/friends` is reserved and answers 501
//!
//! The write and the read share one path pattern; the method decides whether
//! the last segment is a member or a range code.

use crate::{
    error::{ApiError, ApiResult},
    responses::ApiResponse,
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use leaders_application::LeadersQuery;
use leaders_common::parse_datetime;
use leaders_domain::LeadersResult;
use serde::Deserialize;
use tracing::{debug, info};

/// Body of a write.
#[derive(Debug, Default, Deserialize)]
pub struct SetValueRequest {
    /// Score to record
    pub value: Option<f64>,

    /// Tie-break timestamp (RFC 3339, `YYYY-MM-DD HH:MM:SS` or Unix seconds)
    pub timestamp: Option<String>,

    /// Add to the current score instead of replacing it
    #[serde(default)]
    pub increment: bool,
}

/// Query string of a board read.
#[derive(Debug, Default, Deserialize)]
pub struct LeadersParams {
    /// Maximum entries to return
    pub limit: Option<u64>,

    /// Rank position to start at
    pub offset: Option<u64>,

    /// Center the slice on this member
    pub member: Option<String>,

    /// Windows before the current one
    pub slots_ago: Option<u32>,
}

impl From<LeadersParams> for LeadersQuery {
    fn from(params: LeadersParams) -> Self {
        LeadersQuery {
            limit: params.limit,
            offset: params.offset.unwrap_or(0),
            center_on: params.member,
            slots_ago: params.slots_ago.unwrap_or(0),
        }
    }
}

/// Leaderboard routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:game/:metric/:key", get(get_leaders).post(set_value))
        .route("/:game/:metric/:member/friends", get(get_friends))
}

/// Record a member's value
async fn set_value(
    State(state): State<AppState>,
    Path((game, metric, member)): Path<(String, String, String)>,
    body: Option<Json<SetValueRequest>>,
) -> ApiResult<ApiResponse<()>> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let value = request.value.ok_or(ApiError::MissingValue)?;
    let timestamp = request
        .timestamp
        .as_deref()
        .map(parse_datetime)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let board = state.leaderboard(&game, &metric)?;
    if request.increment {
        board.inc_metric(&member, value, timestamp).await?;
    } else {
        board.set_metric(&member, value, timestamp).await?;
    }

    info!(
        game = %game,
        metric = %metric,
        member = %member,
        increment = request.increment,
        "Value recorded"
    );
    Ok(ApiResponse::message("OK"))
}

/// Ranked board for one range
async fn get_leaders(
    State(state): State<AppState>,
    Path((game, metric, range_code)): Path<(String, String, String)>,
    Query(params): Query<LeadersParams>,
) -> ApiResult<ApiResponse<LeadersResult>> {
    let board = state.leaderboard(&game, &metric)?;
    let range = board.range(&range_code)?;
    let query = LeadersQuery::from(params);

    debug!(game = %game, metric = %metric, range = %range, ?query, "Fetching leaders");
    let result = board.leaders(&range, &query).await?;
    Ok(ApiResponse::success(result))
}

/// Friends leaderboard over HTTP
async fn get_friends(
    Path((_game, _metric, _member)): Path<(String, String, String)>,
) -> ApiResult<ApiResponse<LeadersResult>> {
    Err(ApiError::NotImplemented(
        "friends leaderboards are not available over HTTP".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_into_query() {
        let query = LeadersQuery::from(LeadersParams {
            limit: Some(5),
            offset: None,
            member: Some("player1".to_string()),
            slots_ago: Some(2),
        });
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, 0);
        assert_eq!(query.center_on.as_deref(), Some("player1"));
        assert_eq!(query.slots_ago, 2);
    }
}
