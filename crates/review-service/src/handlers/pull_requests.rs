//! Pull request handlers.
//!
//! - `POST /pullRequest/create` - Open a pull request with auto-assigned reviewers
//! - `POST /pullRequest/merge` - Merge (idempotent)
//! - `POST /pullRequest/reassign` - Replace one reviewer

use crate::errors::ReviewError;
use crate::handlers::parse_body;
use crate::models::{
    CreatePullRequestRequest, MergePullRequestRequest, NewPullRequest, PullRequestEnvelope,
    ReassignReviewerRequest, ReassignReviewerResponse,
};
use crate::routes::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /pullRequest/create
///
/// # Response
///
/// - 201 Created: `{"pr": {...}}`
/// - 400 Bad Request: Invalid body
/// - 404 Not Found: Unknown author
/// - 409 Conflict: `PR_EXISTS`
#[instrument(skip_all, name = "review.pr.create")]
pub async fn create_pull_request(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<PullRequestEnvelope>), ReviewError> {
    let request: CreatePullRequestRequest = parse_body(&body)?;
    request.validate().map_err(ReviewError::BadRequest)?;

    let pr = state
        .service
        .create_pr(NewPullRequest {
            pull_request_id: request.pull_request_id,
            title: request.pull_request_name,
            author_id: request.author_id,
            created_at: None,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PullRequestEnvelope { pr: pr.into() }),
    ))
}

/// Handler for POST /pullRequest/merge
///
/// # Response
///
/// - 200 OK: `{"pr": {...}}`, also when already merged
/// - 400 Bad Request: Invalid body
/// - 404 Not Found: Unknown pull request
#[instrument(skip_all, name = "review.pr.merge")]
pub async fn merge_pull_request(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PullRequestEnvelope>, ReviewError> {
    let request: MergePullRequestRequest = parse_body(&body)?;
    request.validate().map_err(ReviewError::BadRequest)?;

    let pr = state.service.merge_pr(&request.pull_request_id).await?;

    Ok(Json(PullRequestEnvelope { pr: pr.into() }))
}

/// Handler for POST /pullRequest/reassign
///
/// # Response
///
/// - 200 OK: `{"pr": {...}, "replaced_by": "..."}`
/// - 400 Bad Request: Invalid body
/// - 404 Not Found: Unknown pull request or reviewer
/// - 409 Conflict: `PR_MERGED`, `NOT_ASSIGNED`, `NO_CANDIDATE`
#[instrument(skip_all, name = "review.pr.reassign")]
pub async fn reassign_reviewer(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReassignReviewerResponse>, ReviewError> {
    let request: ReassignReviewerRequest = parse_body(&body)?;
    request.validate().map_err(ReviewError::BadRequest)?;

    let (pr, replaced_by) = state
        .service
        .reassign_reviewer(&request.pull_request_id, &request.old_user_id)
        .await?;

    Ok(Json(ReassignReviewerResponse {
        pr: pr.into(),
        replaced_by,
    }))
}
