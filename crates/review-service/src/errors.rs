//! Review Service error types.
//!
//! Domain failures are a closed set of variants; the transport layer maps
//! each one to a stable error code and HTTP status via `IntoResponse`.
//! Infrastructure errors are logged server-side and returned to clients as
//! a generic internal error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Review Service error type.
///
/// Maps to HTTP status codes:
/// - BadRequest: 400 Bad Request
/// - NotFound: 404 Not Found
/// - TeamExists, PrExists, PrMerged, NotAssigned, NoCandidate,
///   UserInAnotherTeam: 409 Conflict
/// - Database, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Team already exists")]
    TeamExists,

    #[error("Pull request already exists")]
    PrExists,

    #[error("Pull request is merged")]
    PrMerged,

    #[error("Reviewer is not assigned to this pull request")]
    NotAssigned,

    #[error("No active replacement candidate in team")]
    NoCandidate,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User already belongs to another team")]
    UserInAnotherTeam,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error")]
    Internal,
}

impl ReviewError {
    /// Returns the stable, client-visible error code.
    pub fn code(&self) -> &'static str {
        match self {
            ReviewError::TeamExists => "TEAM_EXISTS",
            ReviewError::PrExists => "PR_EXISTS",
            ReviewError::PrMerged => "PR_MERGED",
            ReviewError::NotAssigned => "NOT_ASSIGNED",
            ReviewError::NoCandidate => "NO_CANDIDATE",
            ReviewError::NotFound(_) => "NOT_FOUND",
            ReviewError::UserInAnotherTeam => "USER_IN_ANOTHER_TEAM",
            ReviewError::BadRequest(_) => "BAD_REQUEST",
            ReviewError::Database(_) | ReviewError::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ReviewError::BadRequest(_) => 400,
            ReviewError::NotFound(_) => 404,
            ReviewError::TeamExists
            | ReviewError::PrExists
            | ReviewError::PrMerged
            | ReviewError::NotAssigned
            | ReviewError::NoCandidate
            | ReviewError::UserInAnotherTeam => 409,
            ReviewError::Database(_) | ReviewError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let message = match &self {
            ReviewError::Database(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "review.database", error = %err, "Database operation failed");
                "An internal error occurred".to_string()
            }
            ReviewError::Internal => "An internal error occurred".to_string(),
            ReviewError::NotFound(resource) => format!("{} not found", resource),
            ReviewError::BadRequest(reason) => reason.clone(),
            other => other.to_string(),
        };

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert sqlx errors to ReviewError
impl From<sqlx::Error> for ReviewError {
    fn from(err: sqlx::Error) -> Self {
        ReviewError::Database(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display_not_found() {
        let error = ReviewError::NotFound("pull request".to_string());
        assert_eq!(format!("{}", error), "Not found: pull request");
    }

    #[test]
    fn test_display_database_error() {
        let error = ReviewError::Database("connection failed".to_string());
        assert_eq!(format!("{}", error), "Database error: connection failed");
    }

    #[test]
    fn test_codes() {
        assert_eq!(ReviewError::TeamExists.code(), "TEAM_EXISTS");
        assert_eq!(ReviewError::PrExists.code(), "PR_EXISTS");
        assert_eq!(ReviewError::PrMerged.code(), "PR_MERGED");
        assert_eq!(ReviewError::NotAssigned.code(), "NOT_ASSIGNED");
        assert_eq!(ReviewError::NoCandidate.code(), "NO_CANDIDATE");
        assert_eq!(ReviewError::NotFound("x".to_string()).code(), "NOT_FOUND");
        assert_eq!(
            ReviewError::UserInAnotherTeam.code(),
            "USER_IN_ANOTHER_TEAM"
        );
        assert_eq!(
            ReviewError::BadRequest("x".to_string()).code(),
            "BAD_REQUEST"
        );
        assert_eq!(
            ReviewError::Database("x".to_string()).code(),
            "INTERNAL_ERROR"
        );
        assert_eq!(ReviewError::Internal.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ReviewError::TeamExists.status_code(), 409);
        assert_eq!(ReviewError::PrExists.status_code(), 409);
        assert_eq!(ReviewError::PrMerged.status_code(), 409);
        assert_eq!(ReviewError::NotAssigned.status_code(), 409);
        assert_eq!(ReviewError::NoCandidate.status_code(), 409);
        assert_eq!(ReviewError::NotFound("x".to_string()).status_code(), 404);
        assert_eq!(ReviewError::UserInAnotherTeam.status_code(), 409);
        assert_eq!(ReviewError::BadRequest("x".to_string()).status_code(), 400);
        assert_eq!(ReviewError::Database("x".to_string()).status_code(), 500);
        assert_eq!(ReviewError::Internal.status_code(), 500);
    }

    #[tokio::test]
    async fn test_into_response_pr_merged() {
        let response = ReviewError::PrMerged.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "PR_MERGED");
        assert_eq!(body_json["error"]["message"], "Pull request is merged");
    }

    #[tokio::test]
    async fn test_into_response_not_found() {
        let response = ReviewError::NotFound("user".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "NOT_FOUND");
        assert_eq!(body_json["error"]["message"], "user not found");
    }

    #[tokio::test]
    async fn test_into_response_team_exists() {
        let response = ReviewError::TeamExists.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "TEAM_EXISTS");
    }

    #[tokio::test]
    async fn test_into_response_database_error_is_generic() {
        let response =
            ReviewError::Database("password authentication failed".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body_json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_into_response_bad_request_keeps_reason() {
        let response =
            ReviewError::BadRequest("author_id is required".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_json = read_body_json(response.into_body()).await;
        assert_eq!(body_json["error"]["code"], "BAD_REQUEST");
        assert_eq!(body_json["error"]["message"], "author_id is required");
    }
}
