//! User handlers.
//!
//! - `POST /users/setIsActive` - Toggle reviewer eligibility
//! - `GET /users/getReview?user_id=` - Pull requests the user reviews

use crate::errors::ReviewError;
use crate::handlers::parse_body;
use crate::models::{
    PullRequestShortResponse, SetIsActiveRequest, UserEnvelope, UserIdQuery, UserReviewsResponse,
};
use crate::routes::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /users/setIsActive
///
/// # Response
///
/// - 200 OK: `{"user": {...}}`
/// - 400 Bad Request: Invalid body
/// - 404 Not Found: Unknown user
#[instrument(skip_all, name = "review.users.set_is_active")]
pub async fn set_user_active(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UserEnvelope>, ReviewError> {
    let request: SetIsActiveRequest = parse_body(&body)?;
    request.validate().map_err(ReviewError::BadRequest)?;

    let user = state
        .service
        .set_user_active(&request.user_id, request.is_active)
        .await?;

    Ok(Json(UserEnvelope { user: user.into() }))
}

/// Handler for GET /users/getReview
///
/// Unknown users get an empty list.
///
/// # Response
///
/// - 200 OK: `{"user_id": ..., "pull_requests": [...]}`
/// - 400 Bad Request: Missing `user_id`
#[instrument(skip_all, name = "review.users.get_review")]
pub async fn get_user_reviews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<UserReviewsResponse>, ReviewError> {
    if query.user_id.trim().is_empty() {
        return Err(ReviewError::BadRequest("user_id is required".to_string()));
    }

    let pull_requests = state
        .service
        .get_assigned_for_user(&query.user_id)
        .await?
        .into_iter()
        .map(PullRequestShortResponse::from)
        .collect();

    Ok(Json(UserReviewsResponse {
        user_id: query.user_id,
        pull_requests,
    }))
}
