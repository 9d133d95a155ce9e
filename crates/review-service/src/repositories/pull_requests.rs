//! Pull requests repository (PostgreSQL).
//!
//! Reviewers are stored in `pr_reviewers` with an explicit `position` so
//! that in-place reassignment keeps list order across reads.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)

use crate::errors::ReviewError;
use crate::models::{PrStatus, PullRequest, ReviewerStat};
use crate::repositories::{is_unique_violation, PullRequestRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::instrument;

/// Pull request row from database.
#[derive(Debug, sqlx::FromRow)]
struct PullRequestRow {
    pr_id: String,
    pr_title: String,
    author_id: String,
    pr_status: String,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
}

impl PullRequestRow {
    fn into_pull_request(self, reviewer_ids: Vec<String>) -> Result<PullRequest, ReviewError> {
        let status = PrStatus::parse(&self.pr_status).ok_or_else(|| {
            ReviewError::Database(format!(
                "Unknown status '{}' for pull request {}",
                self.pr_status, self.pr_id
            ))
        })?;

        Ok(PullRequest {
            pull_request_id: self.pr_id,
            title: self.pr_title,
            author_id: self.author_id,
            status,
            created_at: self.created_at,
            merged_at: self.merged_at,
            reviewer_ids,
        })
    }
}

/// Reviewer load row from database.
#[derive(Debug, sqlx::FromRow)]
struct ReviewerStatRow {
    user_id: String,
    user_name: String,
    team_name: String,
    assigned_open_prs: i64,
}

/// Reviewer link row from database.
#[derive(Debug, sqlx::FromRow)]
struct ReviewerRow {
    pr_id: String,
    reviewer_id: String,
}

/// PostgreSQL-backed pull request repository.
#[derive(Clone)]
pub struct PgPullRequestRepository {
    pool: PgPool,
}

impl PgPullRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_reviewers(&self, pr_id: &str) -> Result<Vec<String>, ReviewError> {
        let reviewers: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT reviewer_id
            FROM pr_reviewers
            WHERE pr_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(pr_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviewers)
    }
}

/// Insert reviewer links for a pull request inside an open transaction.
async fn insert_reviewers(
    tx: &mut Transaction<'_, Postgres>,
    pr_id: &str,
    reviewer_ids: &[String],
) -> Result<(), ReviewError> {
    for (position, reviewer_id) in reviewer_ids.iter().enumerate() {
        let position = i16::try_from(position).map_err(|_| ReviewError::Internal)?;
        sqlx::query(
            r#"
            INSERT INTO pr_reviewers (pr_id, reviewer_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(pr_id)
        .bind(reviewer_id)
        .bind(position)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl PullRequestRepository for PgPullRequestRepository {
    #[instrument(skip_all, fields(pr_id = %pr.pull_request_id))]
    async fn create(&self, pr: &PullRequest) -> Result<PullRequest, ReviewError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO pull_requests (pr_id, pr_title, author_id, pr_status, created_at, merged_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&pr.pull_request_id)
        .bind(&pr.title)
        .bind(&pr.author_id)
        .bind(pr.status.as_str())
        .bind(pr.created_at)
        .bind(pr.merged_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                tracing::warn!(
                    target: "review.repository.pull_requests",
                    pr_id = %pr.pull_request_id,
                    "Pull request already exists"
                );
                return Err(ReviewError::PrExists);
            }
            return Err(e.into());
        }

        insert_reviewers(&mut tx, &pr.pull_request_id, &pr.reviewer_ids).await?;

        tx.commit().await?;

        self.get_by_id(&pr.pull_request_id).await
    }

    #[instrument(skip_all, fields(pr_id = %pr.pull_request_id))]
    async fn update(&self, pr: &PullRequest) -> Result<PullRequest, ReviewError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE pull_requests
            SET pr_title = $1, pr_status = $2, merged_at = $3
            WHERE pr_id = $4
            "#,
        )
        .bind(&pr.title)
        .bind(pr.status.as_str())
        .bind(pr.merged_at)
        .bind(&pr.pull_request_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ReviewError::NotFound("pull request".to_string()));
        }

        sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = $1")
            .bind(&pr.pull_request_id)
            .execute(&mut *tx)
            .await?;

        insert_reviewers(&mut tx, &pr.pull_request_id, &pr.reviewer_ids).await?;

        tx.commit().await?;

        self.get_by_id(&pr.pull_request_id).await
    }

    #[instrument(skip_all, fields(pr_id = %pull_request_id))]
    async fn get_by_id(&self, pull_request_id: &str) -> Result<PullRequest, ReviewError> {
        let row: Option<PullRequestRow> = sqlx::query_as(
            r#"
            SELECT pr_id, pr_title, author_id, pr_status, created_at, merged_at
            FROM pull_requests
            WHERE pr_id = $1
            "#,
        )
        .bind(pull_request_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| ReviewError::NotFound("pull request".to_string()))?;
        let reviewers = self.fetch_reviewers(&row.pr_id).await?;

        row.into_pull_request(reviewers)
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn list_assigned_to(&self, user_id: &str) -> Result<Vec<PullRequest>, ReviewError> {
        let rows: Vec<PullRequestRow> = sqlx::query_as(
            r#"
            SELECT p.pr_id, p.pr_title, p.author_id, p.pr_status, p.created_at, p.merged_at
            FROM pull_requests p
            JOIN pr_reviewers prr ON p.pr_id = prr.pr_id
            WHERE prr.reviewer_id = $1
            ORDER BY p.created_at ASC, p.pr_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let pr_ids: Vec<String> = rows.iter().map(|r| r.pr_id.clone()).collect();
        let links: Vec<ReviewerRow> = sqlx::query_as(
            r#"
            SELECT pr_id, reviewer_id
            FROM pr_reviewers
            WHERE pr_id = ANY($1)
            ORDER BY pr_id ASC, position ASC
            "#,
        )
        .bind(&pr_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut reviewers: HashMap<String, Vec<String>> = HashMap::new();
        for link in links {
            reviewers
                .entry(link.pr_id)
                .or_default()
                .push(link.reviewer_id);
        }

        rows.into_iter()
            .map(|row| {
                let ids = reviewers.remove(&row.pr_id).unwrap_or_default();
                row.into_pull_request(ids)
            })
            .collect()
    }

    #[instrument(skip_all, fields(team = %team_name))]
    async fn list_reviewer_stats(
        &self,
        team_name: &str,
    ) -> Result<Vec<ReviewerStat>, ReviewError> {
        // LEFT JOINs keep active members with no open reviews (count 0).
        let rows: Vec<ReviewerStatRow> = sqlx::query_as(
            r#"
            SELECT
                u.user_id,
                u.user_name,
                u.team_name,
                COUNT(p.pr_id) AS assigned_open_prs
            FROM users u
            LEFT JOIN pr_reviewers prr ON prr.reviewer_id = u.user_id
            LEFT JOIN pull_requests p ON p.pr_id = prr.pr_id AND p.pr_status = 'OPEN'
            WHERE u.team_name = $1
              AND u.is_active = TRUE
            GROUP BY u.user_id, u.user_name, u.team_name
            ORDER BY assigned_open_prs ASC, u.user_id ASC
            "#,
        )
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ReviewerStat {
                user_id: r.user_id,
                username: r.user_name,
                team_name: r.team_name,
                assigned_open_prs: r.assigned_open_prs,
            })
            .collect())
    }
}
