//! HTTP request handlers for the Review Service.

pub mod health;
pub mod metrics;
pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use pull_requests::{create_pull_request, merge_pull_request, reassign_reviewer};
pub use stats::reviewer_stats;
pub use teams::{create_team, get_team};
pub use users::{get_user_reviews, set_user_active};

use crate::errors::ReviewError;
use serde::de::DeserializeOwned;

/// Deserialize a JSON request body.
///
/// Parsed by hand so malformed bodies map to 400 `BAD_REQUEST` instead of
/// axum's default 422.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ReviewError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "review.handlers", error = %e, "Invalid request body");
        ReviewError::BadRequest("Invalid request body".to_string())
    })
}
