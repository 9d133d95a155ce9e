//! Users repository (PostgreSQL).

use crate::errors::ReviewError;
use crate::models::User;
use crate::repositories::UserRepository;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

/// User row from database.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: String,
    user_name: String,
    is_active: bool,
    team_name: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.user_id,
            username: row.user_name,
            team_name: row.team_name,
            is_active: row.is_active,
        }
    }
}

/// PostgreSQL-backed user repository.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn get_by_id(&self, user_id: &str) -> Result<User, ReviewError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            SELECT user_id, user_name, is_active, team_name
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from)
            .ok_or_else(|| ReviewError::NotFound("user".to_string()))
    }

    #[instrument(skip_all, fields(user_id = %user.user_id))]
    async fn create(&self, user: &User) -> Result<User, ReviewError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (user_id, user_name, is_active, team_name)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, user_name, is_active, team_name
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(user.is_active)
        .bind(&user.team_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    #[instrument(skip_all, fields(user_id = %user.user_id))]
    async fn update(&self, user: &User) -> Result<User, ReviewError> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users
            SET user_name = $1, is_active = $2, team_name = $3
            WHERE user_id = $4
            RETURNING user_id, user_name, is_active, team_name
            "#,
        )
        .bind(&user.username)
        .bind(user.is_active)
        .bind(&user.team_name)
        .bind(&user.user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from).ok_or_else(|| {
            tracing::warn!(
                target: "review.repository.users",
                user_id = %user.user_id,
                "User not found for update"
            );
            ReviewError::NotFound("user".to_string())
        })
    }

    #[instrument(skip_all, fields(team = %team_name))]
    async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT user_id, user_name, is_active, team_name
            FROM users
            WHERE team_name = $1
            ORDER BY user_id ASC
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    #[instrument(skip_all, fields(team = %team_name))]
    async fn list_active_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT user_id, user_name, is_active, team_name
            FROM users
            WHERE team_name = $1
              AND is_active = TRUE
            ORDER BY user_id ASC
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
