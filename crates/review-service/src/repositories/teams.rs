//! Teams repository (PostgreSQL).

use crate::errors::ReviewError;
use crate::models::Team;
use crate::repositories::{is_unique_violation, TeamRepository};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

/// PostgreSQL-backed team repository.
#[derive(Clone)]
pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    #[instrument(skip_all, fields(team = %team_name))]
    async fn get_by_name(&self, team_name: &str) -> Result<Team, ReviewError> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT team_name FROM teams WHERE team_name = $1")
                .bind(team_name)
                .fetch_optional(&self.pool)
                .await?;

        name.map(|team_name| Team { team_name })
            .ok_or_else(|| ReviewError::NotFound("team".to_string()))
    }

    #[instrument(skip_all, fields(team = %team.team_name))]
    async fn create(&self, team: &Team) -> Result<Team, ReviewError> {
        sqlx::query("INSERT INTO teams (team_name) VALUES ($1)")
            .bind(&team.team_name)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    tracing::warn!(
                        target: "review.repository.teams",
                        team = %team.team_name,
                        "Team already exists"
                    );
                    ReviewError::TeamExists
                } else {
                    e.into()
                }
            })?;

        Ok(team.clone())
    }
}
