//! Repository layer for the Review Service.
//!
//! The service depends on the traits defined here; PostgreSQL
//! implementations live in the per-table modules and an in-memory
//! implementation for tests lives in [`mock`].
//!
//! Every write that touches more than one table (pull request row plus
//! reviewer rows) runs inside a single database transaction.

pub mod mock;
pub mod pull_requests;
pub mod teams;
pub mod users;

use crate::errors::ReviewError;
use crate::models::{PullRequest, ReviewerStat, Team, User};
use async_trait::async_trait;

pub use mock::InMemoryRepository;
pub use pull_requests::PgPullRequestRepository;
pub use teams::PgTeamRepository;
pub use users::PgUserRepository;

/// Pull request storage.
#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    /// Insert a pull request and its reviewers atomically.
    ///
    /// Fails with `ReviewError::PrExists` if the ID is taken.
    async fn create(&self, pr: &PullRequest) -> Result<PullRequest, ReviewError>;

    /// Update status/merge time and replace the full reviewer list atomically.
    ///
    /// Fails with `ReviewError::NotFound` if the pull request does not exist.
    async fn update(&self, pr: &PullRequest) -> Result<PullRequest, ReviewError>;

    /// Fails with `ReviewError::NotFound` if the pull request does not exist.
    async fn get_by_id(&self, pull_request_id: &str) -> Result<PullRequest, ReviewError>;

    /// Pull requests (any status) where `user_id` is a reviewer.
    async fn list_assigned_to(&self, user_id: &str) -> Result<Vec<PullRequest>, ReviewError>;

    /// Open review counts for the active members of a team, least loaded first.
    async fn list_reviewer_stats(&self, team_name: &str)
        -> Result<Vec<ReviewerStat>, ReviewError>;
}

/// User storage.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `ReviewError::NotFound` if the user does not exist.
    async fn get_by_id(&self, user_id: &str) -> Result<User, ReviewError>;

    async fn create(&self, user: &User) -> Result<User, ReviewError>;

    /// Overwrite name, team and active flag.
    ///
    /// Fails with `ReviewError::NotFound` if the user does not exist.
    async fn update(&self, user: &User) -> Result<User, ReviewError>;

    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError>;

    async fn list_active_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError>;
}

/// Team storage.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Fails with `ReviewError::NotFound` if the team does not exist.
    async fn get_by_name(&self, team_name: &str) -> Result<Team, ReviewError>;

    /// Fails with `ReviewError::TeamExists` if the name is taken.
    async fn create(&self, team: &Team) -> Result<Team, ReviewError>;
}

/// Returns true if the error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
