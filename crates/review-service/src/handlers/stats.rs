//! Reviewer load statistics.

use crate::errors::ReviewError;
use crate::models::{ReviewerStatResponse, ReviewerStatsResponse, TeamNameQuery};
use crate::routes::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /stats/reviewers
///
/// Open review count per active team member, least loaded first.
///
/// # Response
///
/// - 200 OK: `{"items": [...]}`
/// - 400 Bad Request: Missing `team_name`
/// - 404 Not Found: Unknown team
#[instrument(skip_all, name = "review.stats.reviewers")]
pub async fn reviewer_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TeamNameQuery>,
) -> Result<Json<ReviewerStatsResponse>, ReviewError> {
    if query.team_name.trim().is_empty() {
        return Err(ReviewError::BadRequest("team_name is required".to_string()));
    }

    let team = state.service.get_team(&query.team_name).await?;
    let items = state
        .service
        .reviewer_stats(&team.team_name)
        .await?
        .into_iter()
        .map(ReviewerStatResponse::from)
        .collect();

    Ok(Json(ReviewerStatsResponse { items }))
}
