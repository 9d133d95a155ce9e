//! Metrics definitions for the Review Service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `review_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: one value per route plus `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: bounded by error codes

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Routes reported under their own `endpoint` label.
const KNOWN_ENDPOINTS: &[&str] = &[
    "/",
    "/health",
    "/ready",
    "/metrics",
    "/team/add",
    "/team/get",
    "/users/setIsActive",
    "/users/getReview",
    "/pullRequest/create",
    "/pullRequest/merge",
    "/pullRequest/reassign",
    "/stats/reviewers",
];

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("review_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `review_http_requests_total`, `review_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level rejections (415, 422, 404, 405) as well as
/// handler responses.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("review_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("review_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// All routes are static; anything unknown becomes `/other`.
fn normalize_endpoint(path: &str) -> String {
    match KNOWN_ENDPOINTS.iter().find(|known| **known == path) {
        Some(known) => (*known).to_string(),
        None => "/other".to_string(),
    }
}

// ============================================================================
// Domain Metrics
// ============================================================================

/// Record reviewers assigned when a pull request is opened.
///
/// Metric: `review_reviewers_assigned_total`
/// Labels: `count` (0, 1 or 2)
pub fn record_reviewers_assigned(count: usize) {
    counter!("review_reviewers_assigned_total",
        "count" => count.to_string()
    )
    .increment(1);
}

/// Record a reassignment attempt.
///
/// Metric: `review_reassignments_total`
/// Labels: `outcome` (success, or the error code)
pub fn record_reassignment(outcome: &str) {
    counter!("review_reassignments_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a merge request.
///
/// Metric: `review_pr_merges_total`
/// Labels: `outcome` (merged, already_merged)
pub fn record_merge(outcome: &str) {
    counter!("review_pr_merges_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a team creation attempt.
///
/// Metric: `review_teams_created_total`
/// Labels: `outcome` (success, or the error code)
pub fn record_team_creation(outcome: &str) {
    counter!("review_teams_created_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
