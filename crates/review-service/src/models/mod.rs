//! Review Service models.
//!
//! Domain types shared by the service and repository layers, plus the JSON
//! request and response bodies used by the HTTP handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of reviewers assigned when a pull request is opened.
pub const MAX_REVIEWERS: usize = 2;

/// Pull request status.
///
/// `Open --merge--> Merged` is the only transition; `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    /// Pull request is under review.
    Open,

    /// Pull request has been merged.
    Merged,
}

impl PrStatus {
    /// Returns the string representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrStatus::Open => "OPEN",
            PrStatus::Merged => "MERGED",
        }
    }

    /// Parses the database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OPEN" => Some(PrStatus::Open),
            "MERGED" => Some(PrStatus::Merged),
            _ => None,
        }
    }
}

/// A pull request and its reviewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Unique pull request identifier.
    pub pull_request_id: String,

    /// Pull request title.
    pub title: String,

    /// Author user ID. Never present in `reviewer_ids`.
    pub author_id: String,

    /// Current status.
    pub status: PrStatus,

    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,

    /// Merge timestamp (UTC), set once the pull request is merged.
    pub merged_at: Option<DateTime<Utc>>,

    /// Assigned reviewer IDs, in assignment order.
    pub reviewer_ids: Vec<String>,
}

impl PullRequest {
    /// Returns true if `user_id` is currently one of the reviewers.
    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.reviewer_ids.iter().any(|id| id == user_id)
    }
}

/// Input for opening a pull request.
#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub title: String,
    pub author_id: String,
    /// Creation time; stamped with the current time when `None`.
    pub created_at: Option<DateTime<Utc>>,
}

/// A team, identified by its unique name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub team_name: String,
}

/// A user and their team membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier.
    pub user_id: String,

    /// Display name.
    pub username: String,

    /// Team the user belongs to (`None` = unassigned).
    pub team_name: Option<String>,

    /// Whether the user can be picked as a reviewer.
    pub is_active: bool,
}

/// Team member supplied when creating a team.
#[derive(Debug, Clone)]
pub struct NewTeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// Review load for one team member: number of open pull requests the user
/// is reviewing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerStat {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub assigned_open_prs: i64,
}

// ============================================================================
// Health Models
// ============================================================================

/// Readiness probe response.
///
/// Returned by the `/ready` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// Service readiness status ("ready" or "not_ready").
    pub status: &'static str,

    /// Database connectivity status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,

    /// Error message (generic, no infrastructure details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request Models
// ============================================================================

/// Returns an error naming the first empty required field.
fn require_fields(fields: &[(&'static str, &str)]) -> Result<(), String> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(format!("{} is required", name)),
        None => Ok(()),
    }
}

/// Request body for `POST /team/add`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamRequest {
    #[serde(default)]
    pub team_name: String,

    #[serde(default)]
    pub members: Vec<TeamMemberRequest>,
}

impl CreateTeamRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        require_fields(&[("team_name", &self.team_name)])?;
        if self.members.iter().any(|m| m.username.trim().is_empty()) {
            return Err("members[].username is required".to_string());
        }
        Ok(())
    }
}

/// Team member entry in `POST /team/add`.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberRequest {
    /// User ID; a UUID is generated when omitted or empty.
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub is_active: bool,
}

impl TeamMemberRequest {
    /// Convert to a domain member, generating an ID when none was supplied.
    pub fn into_member(self) -> NewTeamMember {
        let user_id = match self.user_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => uuid::Uuid::new_v4().to_string(),
        };
        NewTeamMember {
            user_id,
            username: self.username,
            is_active: self.is_active,
        }
    }
}

/// Query string for endpoints keyed by team name.
#[derive(Debug, Clone, Deserialize)]
pub struct TeamNameQuery {
    #[serde(default)]
    pub team_name: String,
}

/// Query string for endpoints keyed by user ID.
#[derive(Debug, Clone, Deserialize)]
pub struct UserIdQuery {
    #[serde(default)]
    pub user_id: String,
}

/// Request body for `POST /users/setIsActive`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetIsActiveRequest {
    #[serde(default)]
    pub user_id: String,

    pub is_active: bool,
}

impl SetIsActiveRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        require_fields(&[("user_id", &self.user_id)])
    }
}

/// Request body for `POST /pullRequest/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePullRequestRequest {
    #[serde(default)]
    pub pull_request_id: String,

    #[serde(default)]
    pub pull_request_name: String,

    #[serde(default)]
    pub author_id: String,
}

impl CreatePullRequestRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        require_fields(&[
            ("pull_request_id", &self.pull_request_id),
            ("pull_request_name", &self.pull_request_name),
            ("author_id", &self.author_id),
        ])
    }
}

/// Request body for `POST /pullRequest/merge`.
#[derive(Debug, Clone, Deserialize)]
pub struct MergePullRequestRequest {
    #[serde(default)]
    pub pull_request_id: String,
}

impl MergePullRequestRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        require_fields(&[("pull_request_id", &self.pull_request_id)])
    }
}

/// Request body for `POST /pullRequest/reassign`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReassignReviewerRequest {
    #[serde(default)]
    pub pull_request_id: String,

    #[serde(default)]
    pub old_user_id: String,
}

impl ReassignReviewerRequest {
    /// Validate the request.
    pub fn validate(&self) -> Result<(), String> {
        require_fields(&[
            ("pull_request_id", &self.pull_request_id),
            ("old_user_id", &self.old_user_id),
        ])
    }
}

// ============================================================================
// Response Models
// ============================================================================

/// Full pull request representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.title,
            author_id: pr.author_id,
            status: pr.status,
            assigned_reviewers: pr.reviewer_ids,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

/// Short pull request representation used in reviewer listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestShortResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
}

impl From<PullRequest> for PullRequestShortResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.title,
            author_id: pr.author_id,
            status: pr.status,
        }
    }
}

/// `{"pr": ...}` envelope for create and merge responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEnvelope {
    pub pr: PullRequestResponse,
}

/// Response for `POST /pullRequest/reassign`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignReviewerResponse {
    pub pr: PullRequestResponse,
    pub replaced_by: String,
}

/// Team member in team responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberResponse {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// Team with its member roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamResponse {
    pub team_name: String,
    pub members: Vec<TeamMemberResponse>,
}

impl TeamResponse {
    /// Build a team response from a team and its stored members.
    pub fn from_parts(team: Team, members: Vec<User>) -> Self {
        Self {
            team_name: team.team_name,
            members: members
                .into_iter()
                .map(|u| TeamMemberResponse {
                    user_id: u.user_id,
                    username: u.username,
                    is_active: u.is_active,
                })
                .collect(),
        }
    }
}

/// `{"team": ...}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEnvelope {
    pub team: TeamResponse,
}

/// User representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub team_name: Option<String>,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            team_name: user.team_name,
            is_active: user.is_active,
        }
    }
}

/// `{"user": ...}` envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Response for `GET /users/getReview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShortResponse>,
}

/// Review load entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerStatResponse {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub assigned_open_prs: i64,
}

impl From<ReviewerStat> for ReviewerStatResponse {
    fn from(stat: ReviewerStat) -> Self {
        Self {
            user_id: stat.user_id,
            username: stat.username,
            team_name: stat.team_name,
            assigned_open_prs: stat.assigned_open_prs,
        }
    }
}

/// Response for `GET /stats/reviewers`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerStatsResponse {
    pub items: Vec<ReviewerStatResponse>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_pr() -> PullRequest {
        PullRequest {
            pull_request_id: "pr-1001".to_string(),
            title: "Add search".to_string(),
            author_id: "u1".to_string(),
            status: PrStatus::Open,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            merged_at: None,
            reviewer_ids: vec!["u2".to_string(), "u3".to_string()],
        }
    }

    #[test]
    fn test_pr_status_round_trip() {
        assert_eq!(PrStatus::parse(PrStatus::Open.as_str()), Some(PrStatus::Open));
        assert_eq!(
            PrStatus::parse(PrStatus::Merged.as_str()),
            Some(PrStatus::Merged)
        );
        assert_eq!(PrStatus::parse("closed"), None);
    }

    #[test]
    fn test_pr_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&PrStatus::Open).unwrap(), "\"OPEN\"");
        assert_eq!(
            serde_json::to_string(&PrStatus::Merged).unwrap(),
            "\"MERGED\""
        );
    }

    #[test]
    fn test_has_reviewer() {
        let pr = sample_pr();
        assert!(pr.has_reviewer("u2"));
        assert!(!pr.has_reviewer("u1"));
    }

    #[test]
    fn test_pull_request_response_omits_missing_merged_at() {
        let json = serde_json::to_value(PullRequestResponse::from(sample_pr())).unwrap();

        assert_eq!(json["pull_request_id"], "pr-1001");
        assert_eq!(json["pull_request_name"], "Add search");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["assigned_reviewers"], serde_json::json!(["u2", "u3"]));
        assert!(json.get("merged_at").is_none());
    }

    #[test]
    fn test_create_pull_request_validation() {
        let valid = CreatePullRequestRequest {
            pull_request_id: "pr-1".to_string(),
            pull_request_name: "Fix".to_string(),
            author_id: "u1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let missing_author = CreatePullRequestRequest {
            author_id: "  ".to_string(),
            ..valid
        };
        assert_eq!(
            missing_author.validate().unwrap_err(),
            "author_id is required"
        );
    }

    #[test]
    fn test_create_team_request_defaults() {
        let request: CreateTeamRequest =
            serde_json::from_str(r#"{"team_name": "backend"}"#).unwrap();
        assert_eq!(request.team_name, "backend");
        assert!(request.members.is_empty());
        assert!(request.validate().is_ok());

        let missing_name: CreateTeamRequest = serde_json::from_str(r#"{"members": []}"#).unwrap();
        assert_eq!(missing_name.validate().unwrap_err(), "team_name is required");
    }

    #[test]
    fn test_team_member_generates_id_when_missing() {
        let member = TeamMemberRequest {
            user_id: None,
            username: "Alice".to_string(),
            is_active: true,
        }
        .into_member();
        assert!(uuid::Uuid::parse_str(&member.user_id).is_ok());

        let member = TeamMemberRequest {
            user_id: Some("u1".to_string()),
            username: "Alice".to_string(),
            is_active: false,
        }
        .into_member();
        assert_eq!(member.user_id, "u1");
        assert!(!member.is_active);
    }
}
