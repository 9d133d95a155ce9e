//! Pull request operations: open with auto-assigned reviewers, reassign,
//! merge, and reviewer-side listings.

use crate::errors::ReviewError;
use crate::models::{NewPullRequest, PrStatus, PullRequest, ReviewerStat, MAX_REVIEWERS};
use crate::observability::metrics;
use crate::services::ReviewService;
use chrono::Utc;
use std::collections::HashSet;
use tracing::instrument;

impl ReviewService {
    /// Open a pull request and assign up to two reviewers from the author's
    /// team.
    ///
    /// Candidates are the author's active teammates. They are shuffled
    /// uniformly and the first [`MAX_REVIEWERS`] are kept, so zero, one or
    /// two reviewers may be assigned.
    ///
    /// # Errors
    ///
    /// - `ReviewError::NotFound` - Author does not exist
    /// - `ReviewError::PrExists` - Pull request ID already taken
    /// - `ReviewError::Database` - Storage failure
    #[instrument(skip_all, fields(pr_id = %new_pr.pull_request_id, author_id = %new_pr.author_id))]
    pub async fn create_pr(&self, new_pr: NewPullRequest) -> Result<PullRequest, ReviewError> {
        let author = self.users.get_by_id(&new_pr.author_id).await?;

        let stats = match author.team_name.as_deref() {
            Some(team_name) => self.pull_requests.list_reviewer_stats(team_name).await?,
            None => Vec::new(),
        };

        let mut candidates: Vec<String> = stats
            .into_iter()
            .map(|stat| stat.user_id)
            .filter(|user_id| *user_id != author.user_id)
            .collect();

        if candidates.len() > 1 {
            self.random.shuffle(&mut candidates);
        }
        candidates.truncate(MAX_REVIEWERS);

        let pr = PullRequest {
            pull_request_id: new_pr.pull_request_id,
            title: new_pr.title,
            author_id: author.user_id,
            status: PrStatus::Open,
            created_at: new_pr.created_at.unwrap_or_else(Utc::now),
            merged_at: None,
            reviewer_ids: candidates,
        };

        let created = self.pull_requests.create(&pr).await?;

        metrics::record_reviewers_assigned(created.reviewer_ids.len());
        tracing::info!(
            target: "review.service.pull_requests",
            pr_id = %created.pull_request_id,
            reviewers = ?created.reviewer_ids,
            "Pull request created"
        );

        Ok(created)
    }

    /// Replace one reviewer with a random active teammate of that reviewer.
    ///
    /// The replacement takes the old reviewer's position in the list. It is
    /// never the author or anyone already reviewing.
    ///
    /// Returns the updated pull request and the new reviewer's ID.
    ///
    /// # Errors
    ///
    /// - `ReviewError::NotFound` - Pull request or old reviewer does not exist
    /// - `ReviewError::PrMerged` - Pull request is merged
    /// - `ReviewError::NotAssigned` - `old_user_id` is not a reviewer
    /// - `ReviewError::NoCandidate` - No eligible replacement
    #[instrument(skip_all, fields(pr_id = %pull_request_id, old_reviewer = %old_user_id))]
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> Result<(PullRequest, String), ReviewError> {
        let result = self.try_reassign(pull_request_id, old_user_id).await;

        match &result {
            Ok((_, new_id)) => {
                metrics::record_reassignment("success");
                tracing::info!(
                    target: "review.service.pull_requests",
                    pr_id = %pull_request_id,
                    old_reviewer = %old_user_id,
                    new_reviewer = %new_id,
                    "Reviewer reassigned"
                );
            }
            Err(e) => {
                metrics::record_reassignment(e.code());
                tracing::warn!(
                    target: "review.service.pull_requests",
                    pr_id = %pull_request_id,
                    old_reviewer = %old_user_id,
                    error = %e,
                    "Reviewer reassignment rejected"
                );
            }
        }

        result
    }

    async fn try_reassign(
        &self,
        pull_request_id: &str,
        old_user_id: &str,
    ) -> Result<(PullRequest, String), ReviewError> {
        let mut pr = self.pull_requests.get_by_id(pull_request_id).await?;

        if pr.status == PrStatus::Merged {
            return Err(ReviewError::PrMerged);
        }

        let slot = pr
            .reviewer_ids
            .iter()
            .position(|id| id == old_user_id)
            .ok_or(ReviewError::NotAssigned)?;

        let old_reviewer = self.users.get_by_id(old_user_id).await?;
        let members = match old_reviewer.team_name.as_deref() {
            Some(team_name) => self.users.list_by_team(team_name).await?,
            None => Vec::new(),
        };

        let current: HashSet<&str> = pr.reviewer_ids.iter().map(String::as_str).collect();
        let candidates: Vec<String> = members
            .into_iter()
            .filter(|u| u.is_active)
            .filter(|u| u.user_id != pr.author_id)
            .filter(|u| !current.contains(u.user_id.as_str()))
            .map(|u| u.user_id)
            .collect();

        let new_id = self
            .random
            .pick(candidates.len())
            .and_then(|index| candidates.get(index).cloned())
            .ok_or(ReviewError::NoCandidate)?;

        let entry = pr.reviewer_ids.get_mut(slot).ok_or(ReviewError::Internal)?;
        *entry = new_id.clone();

        let updated = self.pull_requests.update(&pr).await?;
        Ok((updated, new_id))
    }

    /// Mark a pull request as merged. Idempotent.
    ///
    /// An already merged pull request is returned unchanged; if it is missing
    /// its merge time, the time is backfilled and persisted.
    ///
    /// # Errors
    ///
    /// - `ReviewError::NotFound` - Pull request does not exist
    #[instrument(skip_all, fields(pr_id = %pull_request_id))]
    pub async fn merge_pr(&self, pull_request_id: &str) -> Result<PullRequest, ReviewError> {
        let mut pr = self.pull_requests.get_by_id(pull_request_id).await?;

        if pr.status == PrStatus::Merged {
            if pr.merged_at.is_some() {
                metrics::record_merge("already_merged");
                tracing::debug!(
                    target: "review.service.pull_requests",
                    pr_id = %pull_request_id,
                    "Pull request already merged"
                );
                return Ok(pr);
            }

            pr.merged_at = Some(Utc::now());
            let repaired = self.pull_requests.update(&pr).await?;
            metrics::record_merge("backfilled");
            tracing::warn!(
                target: "review.service.pull_requests",
                pr_id = %pull_request_id,
                "Merged pull request had no merge time, backfilled"
            );
            return Ok(repaired);
        }

        pr.status = PrStatus::Merged;
        pr.merged_at = Some(Utc::now());

        let merged = self.pull_requests.update(&pr).await?;

        metrics::record_merge("merged");
        tracing::info!(
            target: "review.service.pull_requests",
            pr_id = %pull_request_id,
            "Pull request merged"
        );

        Ok(merged)
    }

    /// Pull requests (open and merged) where the user is a reviewer.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn get_assigned_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<PullRequest>, ReviewError> {
        self.pull_requests.list_assigned_to(user_id).await
    }

    /// Open review load of the team's active members, least loaded first.
    #[instrument(skip_all, fields(team = %team_name))]
    pub async fn reviewer_stats(&self, team_name: &str) -> Result<Vec<ReviewerStat>, ReviewError> {
        self.pull_requests.list_reviewer_stats(team_name).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryRepository;
    use crate::services::random::mock::{FirstChoice, LastChoice};
    use crate::services::random::SeededRandom;
    use crate::services::test_support::service_with;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn new_pr(id: &str, author: &str) -> NewPullRequest {
        NewPullRequest {
            pull_request_id: id.to_string(),
            title: format!("Title {}", id),
            author_id: author.to_string(),
            created_at: None,
        }
    }

    /// backend: A (author), B, C, D, E all active.
    fn backend_team() -> Arc<InMemoryRepository> {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_team("backend");
        for id in ["A", "B", "C", "D", "E"] {
            repo.insert_user(id, Some("backend"), true);
        }
        repo
    }

    fn stored_pr(id: &str, status: PrStatus, author: &str, reviewers: &[&str]) -> PullRequest {
        PullRequest {
            pull_request_id: id.to_string(),
            title: "Stored".to_string(),
            author_id: author.to_string(),
            status,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            merged_at: None,
            reviewer_ids: reviewers.iter().map(|r| r.to_string()).collect(),
        }
    }

    // ------------------------------------------------------------------
    // create_pr
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_pr_assigns_two_non_author_reviewers() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(SeededRandom::new(3)));

        for i in 0..20 {
            let pr = service
                .create_pr(new_pr(&format!("pr-{i}"), "A"))
                .await
                .unwrap();

            assert_eq!(pr.status, PrStatus::Open);
            assert_eq!(pr.reviewer_ids.len(), 2);
            assert!(!pr.has_reviewer("A"));
            assert_ne!(pr.reviewer_ids[0], pr.reviewer_ids[1]);
            assert!(pr.merged_at.is_none());
        }
    }

    #[tokio::test]
    async fn test_create_pr_single_teammate() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_team("duo");
        repo.insert_user("A", Some("duo"), true);
        repo.insert_user("B", Some("duo"), true);
        let service = service_with(&repo, Arc::new(SeededRandom::new(1)));

        let pr = service.create_pr(new_pr("pr-1", "A")).await.unwrap();

        assert_eq!(pr.reviewer_ids, vec!["B"]);
    }

    #[tokio::test]
    async fn test_create_pr_solo_author_gets_no_reviewers() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_team("solo");
        repo.insert_user("A", Some("solo"), true);
        repo.insert_user("B", Some("solo"), false);
        let service = service_with(&repo, Arc::new(SeededRandom::new(1)));

        let pr = service.create_pr(new_pr("pr-1", "A")).await.unwrap();

        assert!(pr.reviewer_ids.is_empty());
        assert!(repo.pull_request("pr-1").is_some());
    }

    #[tokio::test]
    async fn test_create_pr_author_without_team() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_user("A", None, true);
        let service = service_with(&repo, Arc::new(FirstChoice));

        let pr = service.create_pr(new_pr("pr-1", "A")).await.unwrap();

        assert!(pr.reviewer_ids.is_empty());
    }

    #[tokio::test]
    async fn test_create_pr_skips_inactive_members() {
        let repo = backend_team();
        repo.insert_user("C", Some("backend"), false);
        repo.insert_user("D", Some("backend"), false);
        repo.insert_user("E", Some("backend"), false);
        let service = service_with(&repo, Arc::new(FirstChoice));

        let pr = service.create_pr(new_pr("pr-1", "A")).await.unwrap();

        assert_eq!(pr.reviewer_ids, vec!["B"]);
    }

    #[tokio::test]
    async fn test_create_pr_uses_shuffled_order() {
        let repo = backend_team();

        // Candidates arrive least-loaded first, ties by ID: B, C, D, E.
        let first = service_with(&repo, Arc::new(FirstChoice));
        let pr = first.create_pr(new_pr("pr-1", "A")).await.unwrap();
        assert_eq!(pr.reviewer_ids, vec!["B", "C"]);

        // B and C now carry one open review each: D, E, B, C, reversed.
        let last = service_with(&repo, Arc::new(LastChoice));
        let pr = last.create_pr(new_pr("pr-2", "A")).await.unwrap();
        assert_eq!(pr.reviewer_ids, vec!["C", "B"]);
    }

    #[tokio::test]
    async fn test_create_pr_keeps_supplied_created_at() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(FirstChoice));
        let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap();

        let pr = service
            .create_pr(NewPullRequest {
                created_at: Some(created_at),
                ..new_pr("pr-1", "A")
            })
            .await
            .unwrap();

        assert_eq!(pr.created_at, created_at);
    }

    #[tokio::test]
    async fn test_create_pr_unknown_author() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.create_pr(new_pr("pr-1", "ghost")).await;

        assert!(matches!(result, Err(ReviewError::NotFound(_))));
        assert!(repo.pull_request("pr-1").is_none());
    }

    #[tokio::test]
    async fn test_create_pr_duplicate_id() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(FirstChoice));

        service.create_pr(new_pr("pr-1", "A")).await.unwrap();
        let result = service.create_pr(new_pr("pr-1", "B")).await;

        assert!(matches!(result, Err(ReviewError::PrExists)));
        assert_eq!(repo.pull_request("pr-1").unwrap().author_id, "A");
    }

    #[tokio::test]
    async fn test_create_pr_propagates_storage_failure() {
        let repo = Arc::new(InMemoryRepository::failing());
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.create_pr(new_pr("pr-1", "A")).await;

        assert!(matches!(result, Err(ReviewError::Database(_))));
    }

    // ------------------------------------------------------------------
    // reassign_reviewer
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_reassign_replaces_in_place() {
        let repo = backend_team();
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Open, "A", &["B", "C"]));
        let service = service_with(&repo, Arc::new(SeededRandom::new(11)));

        let (pr, new_id) = service.reassign_reviewer("pr-1", "B").await.unwrap();

        assert!(new_id == "D" || new_id == "E", "unexpected {new_id}");
        assert_eq!(pr.reviewer_ids, vec![new_id.clone(), "C".to_string()]);
        assert_eq!(repo.pull_request("pr-1").unwrap().reviewer_ids, pr.reviewer_ids);
    }

    #[tokio::test]
    async fn test_reassign_never_picks_author_or_current_reviewer() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(SeededRandom::new(5)));

        for i in 0..30 {
            let id = format!("pr-{i}");
            repo.insert_pull_request(stored_pr(&id, PrStatus::Open, "A", &["B", "C"]));

            let (pr, new_id) = service.reassign_reviewer(&id, "C").await.unwrap();

            assert!(!["A", "B", "C"].contains(&new_id.as_str()));
            assert_eq!(pr.reviewer_ids[0], "B");
            assert_eq!(pr.reviewer_ids[1], new_id);
        }
    }

    #[tokio::test]
    async fn test_reassign_uses_old_reviewers_team() {
        let repo = backend_team();
        repo.insert_team("frontend");
        repo.insert_user("F1", Some("frontend"), true);
        repo.insert_user("F2", Some("frontend"), true);
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Open, "A", &["F1"]));
        let service = service_with(&repo, Arc::new(FirstChoice));

        let (_, new_id) = service.reassign_reviewer("pr-1", "F1").await.unwrap();

        assert_eq!(new_id, "F2");
    }

    #[tokio::test]
    async fn test_reassign_merged_pr_is_rejected_and_untouched() {
        let repo = backend_team();
        let mut merged = stored_pr("pr-1", PrStatus::Merged, "A", &["B", "C"]);
        merged.merged_at = Some(Utc::now());
        repo.insert_pull_request(merged.clone());
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.reassign_reviewer("pr-1", "B").await;

        assert!(matches!(result, Err(ReviewError::PrMerged)));
        assert_eq!(repo.pull_request("pr-1").unwrap(), merged);
    }

    #[tokio::test]
    async fn test_reassign_not_assigned() {
        let repo = backend_team();
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Open, "A", &["B", "C"]));
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.reassign_reviewer("pr-1", "D").await;

        assert!(matches!(result, Err(ReviewError::NotAssigned)));
    }

    #[tokio::test]
    async fn test_reassign_no_candidate() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.insert_team("small");
        repo.insert_user("A", Some("small"), true);
        repo.insert_user("B", Some("small"), true);
        repo.insert_user("C", Some("small"), true);
        repo.insert_user("D", Some("small"), false);
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Open, "A", &["B", "C"]));
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.reassign_reviewer("pr-1", "B").await;

        assert!(matches!(result, Err(ReviewError::NoCandidate)));
        assert_eq!(
            repo.pull_request("pr-1").unwrap().reviewer_ids,
            vec!["B", "C"]
        );
    }

    #[tokio::test]
    async fn test_reassign_unknown_pr() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.reassign_reviewer("missing", "B").await;

        assert!(matches!(result, Err(ReviewError::NotFound(_))));
    }

    // ------------------------------------------------------------------
    // merge_pr
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_merge_sets_status_and_time() {
        let repo = backend_team();
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Open, "A", &["B", "C"]));
        let service = service_with(&repo, Arc::new(FirstChoice));

        let pr = service.merge_pr("pr-1").await.unwrap();

        assert_eq!(pr.status, PrStatus::Merged);
        assert!(pr.merged_at.is_some());
        assert_eq!(pr.reviewer_ids, vec!["B", "C"]);
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let repo = backend_team();
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Open, "A", &["B", "C"]));
        let service = service_with(&repo, Arc::new(FirstChoice));

        let first = service.merge_pr("pr-1").await.unwrap();
        let second = service.merge_pr("pr-1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.merged_at, first.merged_at);
    }

    #[tokio::test]
    async fn test_merge_backfills_missing_time() {
        let repo = backend_team();
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Merged, "A", &["B"]));
        let service = service_with(&repo, Arc::new(FirstChoice));

        let pr = service.merge_pr("pr-1").await.unwrap();

        assert_eq!(pr.status, PrStatus::Merged);
        assert!(pr.merged_at.is_some());
        assert_eq!(repo.pull_request("pr-1").unwrap().merged_at, pr.merged_at);
    }

    #[tokio::test]
    async fn test_merge_unknown_pr() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.merge_pr("missing").await;

        assert!(matches!(result, Err(ReviewError::NotFound(_))));
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_assigned_for_user_includes_merged() {
        let repo = backend_team();
        let service = service_with(&repo, Arc::new(FirstChoice));

        service.create_pr(new_pr("pr-1", "A")).await.unwrap();
        service.merge_pr("pr-1").await.unwrap();
        service.create_pr(new_pr("pr-2", "D")).await.unwrap();

        let assigned = service.get_assigned_for_user("B").await.unwrap();
        let ids: Vec<&str> = assigned.iter().map(|p| p.pull_request_id.as_str()).collect();

        assert!(ids.contains(&"pr-1"));
        assert!(ids.contains(&"pr-2"));
        // pr-1 went to B, C and pr-2 to A, B; E reviews nothing.
        assert!(service.get_assigned_for_user("E").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reviewer_stats_counts_open_only() {
        let repo = backend_team();
        repo.insert_pull_request(stored_pr("pr-1", PrStatus::Open, "A", &["B", "C"]));
        repo.insert_pull_request(stored_pr("pr-2", PrStatus::Open, "A", &["B"]));
        repo.insert_pull_request(stored_pr("pr-3", PrStatus::Merged, "A", &["D"]));
        let service = service_with(&repo, Arc::new(FirstChoice));

        let stats = service.reviewer_stats("backend").await.unwrap();
        let summary: Vec<(&str, i64)> = stats
            .iter()
            .map(|s| (s.user_id.as_str(), s.assigned_open_prs))
            .collect();

        assert_eq!(
            summary,
            vec![("A", 0), ("D", 0), ("E", 0), ("C", 1), ("B", 2)]
        );
    }
}
