//! Team handlers.
//!
//! - `POST /team/add` - Create a team with its members
//! - `GET /team/get?team_name=` - Team with its member roster

use crate::errors::ReviewError;
use crate::handlers::parse_body;
use crate::models::{CreateTeamRequest, TeamEnvelope, TeamNameQuery, TeamResponse};
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /team/add
///
/// # Response
///
/// - 201 Created: `{"team": {...}}` with the roster as stored
/// - 400 Bad Request: Invalid body
/// - 409 Conflict: `TEAM_EXISTS`, `USER_IN_ANOTHER_TEAM`
#[instrument(skip_all, name = "review.team.add")]
pub async fn create_team(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<TeamEnvelope>), ReviewError> {
    let request: CreateTeamRequest = parse_body(&body)?;
    request.validate().map_err(ReviewError::BadRequest)?;

    let members = request
        .members
        .into_iter()
        .map(|m| m.into_member())
        .collect();

    let team = state.service.create_team(&request.team_name, members).await?;
    let roster = state.service.list_by_team(&team.team_name).await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamEnvelope {
            team: TeamResponse::from_parts(team, roster),
        }),
    ))
}

/// Handler for GET /team/get
///
/// # Response
///
/// - 200 OK: `{"team": {...}}`
/// - 400 Bad Request: Missing `team_name`
/// - 404 Not Found: Unknown team
#[instrument(skip_all, name = "review.team.get")]
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TeamNameQuery>,
) -> Result<Json<TeamEnvelope>, ReviewError> {
    if query.team_name.trim().is_empty() {
        return Err(ReviewError::BadRequest("team_name is required".to_string()));
    }

    let team = state.service.get_team(&query.team_name).await?;
    let roster = state.service.list_by_team(&team.team_name).await?;

    Ok(Json(TeamEnvelope {
        team: TeamResponse::from_parts(team, roster),
    }))
}
