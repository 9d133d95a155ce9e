//! Service layer for the Review Service.
//!
//! [`ReviewService`] owns the business rules: reviewer selection, reassignment,
//! idempotent merge, and team membership. Storage and randomness are injected,
//! so the same rules run against PostgreSQL in production and against
//! [`InMemoryRepository`](crate::repositories::InMemoryRepository) in tests.
//!
//! # Components
//!
//! - `pull_requests` - Create, merge, reassign, reviewer listings and load
//! - `teams` - Team creation and lookup
//! - `users` - User lookup and activation
//! - `random` - Uniform random source used for reviewer selection

pub mod pull_requests;
pub mod random;
pub mod teams;
pub mod users;

use crate::repositories::{
    PgPullRequestRepository, PgTeamRepository, PgUserRepository, PullRequestRepository,
    TeamRepository, UserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;

pub use random::{RandomSource, SeededRandom, ThreadRandom};

/// Review assignment service.
///
/// Cheap to clone; all dependencies are shared.
#[derive(Clone)]
pub struct ReviewService {
    pull_requests: Arc<dyn PullRequestRepository>,
    users: Arc<dyn UserRepository>,
    teams: Arc<dyn TeamRepository>,
    random: Arc<dyn RandomSource>,
}

impl ReviewService {
    /// Create a service from explicit dependencies.
    pub fn new(
        pull_requests: Arc<dyn PullRequestRepository>,
        users: Arc<dyn UserRepository>,
        teams: Arc<dyn TeamRepository>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            pull_requests,
            users,
            teams,
            random,
        }
    }

    /// Create a service backed by PostgreSQL with the given random source.
    pub fn with_pool(pool: PgPool, random: Arc<dyn RandomSource>) -> Self {
        Self::new(
            Arc::new(PgPullRequestRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool.clone())),
            Arc::new(PgTeamRepository::new(pool)),
            random,
        )
    }

    /// Create a service backed by PostgreSQL and thread-local randomness.
    pub fn postgres(pool: PgPool) -> Self {
        Self::with_pool(pool, Arc::new(ThreadRandom))
    }
}
