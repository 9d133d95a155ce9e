//! In-memory repository for tests.
//!
//! One [`InMemoryRepository`] implements all three storage traits over a
//! shared state, so a test can hand the same `Arc` to every slot of
//! [`ReviewService`](crate::services::ReviewService).

use crate::errors::ReviewError;
use crate::models::{PrStatus, PullRequest, ReviewerStat, Team, User};
use crate::repositories::{PullRequestRepository, TeamRepository, UserRepository};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    teams: BTreeMap<String, Team>,
    users: BTreeMap<String, User>,
    pull_requests: BTreeMap<String, PullRequest>,
}

/// In-memory storage backed by ordered maps.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
    should_fail: bool,
}

impl InMemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository whose every call fails with a database error.
    pub fn failing() -> Self {
        Self {
            state: Mutex::new(State::default()),
            should_fail: true,
        }
    }

    /// Insert a team directly, bypassing service rules.
    pub fn insert_team(&self, team_name: &str) {
        self.lock().teams.insert(
            team_name.to_string(),
            Team {
                team_name: team_name.to_string(),
            },
        );
    }

    /// Insert a user directly, bypassing service rules.
    pub fn insert_user(&self, user_id: &str, team_name: Option<&str>, is_active: bool) {
        self.lock().users.insert(
            user_id.to_string(),
            User {
                user_id: user_id.to_string(),
                username: format!("user-{}", user_id),
                team_name: team_name.map(str::to_string),
                is_active,
            },
        );
    }

    /// Insert a pull request directly, bypassing service rules.
    pub fn insert_pull_request(&self, pr: PullRequest) {
        self.lock()
            .pull_requests
            .insert(pr.pull_request_id.clone(), pr);
    }

    /// Snapshot of a stored pull request.
    pub fn pull_request(&self, pull_request_id: &str) -> Option<PullRequest> {
        self.lock().pull_requests.get(pull_request_id).cloned()
    }

    /// Snapshot of a stored user.
    pub fn user(&self, user_id: &str) -> Option<User> {
        self.lock().users.get(user_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self) -> Result<(), ReviewError> {
        if self.should_fail {
            return Err(ReviewError::Database(
                "Mock repository failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PullRequestRepository for InMemoryRepository {
    async fn create(&self, pr: &PullRequest) -> Result<PullRequest, ReviewError> {
        self.check()?;
        let mut state = self.lock();
        if state.pull_requests.contains_key(&pr.pull_request_id) {
            return Err(ReviewError::PrExists);
        }
        state
            .pull_requests
            .insert(pr.pull_request_id.clone(), pr.clone());
        Ok(pr.clone())
    }

    async fn update(&self, pr: &PullRequest) -> Result<PullRequest, ReviewError> {
        self.check()?;
        let mut state = self.lock();
        match state.pull_requests.get_mut(&pr.pull_request_id) {
            Some(stored) => {
                *stored = pr.clone();
                Ok(pr.clone())
            }
            None => Err(ReviewError::NotFound("pull request".to_string())),
        }
    }

    async fn get_by_id(&self, pull_request_id: &str) -> Result<PullRequest, ReviewError> {
        self.check()?;
        self.lock()
            .pull_requests
            .get(pull_request_id)
            .cloned()
            .ok_or_else(|| ReviewError::NotFound("pull request".to_string()))
    }

    async fn list_assigned_to(&self, user_id: &str) -> Result<Vec<PullRequest>, ReviewError> {
        self.check()?;
        let mut prs: Vec<PullRequest> = self
            .lock()
            .pull_requests
            .values()
            .filter(|pr| pr.has_reviewer(user_id))
            .cloned()
            .collect();
        prs.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.pull_request_id.cmp(&b.pull_request_id))
        });
        Ok(prs)
    }

    async fn list_reviewer_stats(
        &self,
        team_name: &str,
    ) -> Result<Vec<ReviewerStat>, ReviewError> {
        self.check()?;
        let state = self.lock();
        let mut stats: Vec<ReviewerStat> = state
            .users
            .values()
            .filter(|u| u.is_active && u.team_name.as_deref() == Some(team_name))
            .map(|u| {
                let open = state
                    .pull_requests
                    .values()
                    .filter(|pr| pr.status == PrStatus::Open && pr.has_reviewer(&u.user_id))
                    .count();
                ReviewerStat {
                    user_id: u.user_id.clone(),
                    username: u.username.clone(),
                    team_name: team_name.to_string(),
                    assigned_open_prs: i64::try_from(open).unwrap_or(i64::MAX),
                }
            })
            .collect();
        stats.sort_by(|a, b| {
            a.assigned_open_prs
                .cmp(&b.assigned_open_prs)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(stats)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_by_id(&self, user_id: &str) -> Result<User, ReviewError> {
        self.check()?;
        self.lock()
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ReviewError::NotFound("user".to_string()))
    }

    async fn create(&self, user: &User) -> Result<User, ReviewError> {
        self.check()?;
        let mut state = self.lock();
        if state.users.contains_key(&user.user_id) {
            return Err(ReviewError::Database(format!(
                "duplicate key value for user {}",
                user.user_id
            )));
        }
        state.users.insert(user.user_id.clone(), user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, ReviewError> {
        self.check()?;
        let mut state = self.lock();
        match state.users.get_mut(&user.user_id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(user.clone())
            }
            None => Err(ReviewError::NotFound("user".to_string())),
        }
    }

    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .values()
            .filter(|u| u.team_name.as_deref() == Some(team_name))
            .cloned()
            .collect())
    }

    async fn list_active_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .values()
            .filter(|u| u.is_active && u.team_name.as_deref() == Some(team_name))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TeamRepository for InMemoryRepository {
    async fn get_by_name(&self, team_name: &str) -> Result<Team, ReviewError> {
        self.check()?;
        self.lock()
            .teams
            .get(team_name)
            .cloned()
            .ok_or_else(|| ReviewError::NotFound("team".to_string()))
    }

    async fn create(&self, team: &Team) -> Result<Team, ReviewError> {
        self.check()?;
        let mut state = self.lock();
        if state.teams.contains_key(&team.team_name) {
            return Err(ReviewError::TeamExists);
        }
        state.teams.insert(team.team_name.clone(), team.clone());
        Ok(team.clone())
    }
}
