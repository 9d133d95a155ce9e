//! Team operations.

use crate::errors::ReviewError;
use crate::models::{NewTeamMember, Team, User};
use crate::observability::metrics;
use crate::services::ReviewService;
use tracing::instrument;

impl ReviewService {
    /// Create a team and attach its members.
    ///
    /// Unknown members are created on the team. Existing members with no
    /// team (or already on this team) are moved onto it and get the supplied
    /// name and active flag.
    ///
    /// The steps are not one transaction: a member conflict leaves the team
    /// row and members processed before it in place.
    ///
    /// # Errors
    ///
    /// - `ReviewError::TeamExists` - Team name already taken
    /// - `ReviewError::UserInAnotherTeam` - A member belongs to a different team
    /// - `ReviewError::Database` - Storage failure
    #[instrument(skip_all, fields(team = %team_name, members = members.len()))]
    pub async fn create_team(
        &self,
        team_name: &str,
        members: Vec<NewTeamMember>,
    ) -> Result<Team, ReviewError> {
        let result = self.try_create_team(team_name, members).await;

        match &result {
            Ok(_) => {
                metrics::record_team_creation("success");
                tracing::info!(
                    target: "review.service.teams",
                    team = %team_name,
                    "Team created"
                );
            }
            Err(e) => {
                metrics::record_team_creation(e.code());
                tracing::warn!(
                    target: "review.service.teams",
                    team = %team_name,
                    error = %e,
                    "Team creation failed"
                );
            }
        }

        result
    }

    async fn try_create_team(
        &self,
        team_name: &str,
        members: Vec<NewTeamMember>,
    ) -> Result<Team, ReviewError> {
        match self.teams.get_by_name(team_name).await {
            Ok(_) => return Err(ReviewError::TeamExists),
            Err(ReviewError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let team = self
            .teams
            .create(&Team {
                team_name: team_name.to_string(),
            })
            .await?;

        for member in members {
            let user = User {
                user_id: member.user_id,
                username: member.username,
                team_name: Some(team_name.to_string()),
                is_active: member.is_active,
            };

            match self.users.get_by_id(&user.user_id).await {
                Ok(existing) => {
                    let on_other_team = existing
                        .team_name
                        .as_deref()
                        .is_some_and(|current| !current.is_empty() && current != team_name);
                    if on_other_team {
                        return Err(ReviewError::UserInAnotherTeam);
                    }
                    self.users.update(&user).await?;
                    tracing::debug!(
                        target: "review.service.teams",
                        user_id = %user.user_id,
                        "Existing user joined team"
                    );
                }
                Err(ReviewError::NotFound(_)) => {
                    self.users.create(&user).await?;
                    tracing::debug!(
                        target: "review.service.teams",
                        user_id = %user.user_id,
                        "User created on team"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(team)
    }

    /// Look up a team by name.
    ///
    /// # Errors
    ///
    /// - `ReviewError::NotFound` - Team does not exist
    #[instrument(skip_all, fields(team = %team_name))]
    pub async fn get_team(&self, team_name: &str) -> Result<Team, ReviewError> {
        self.teams.get_by_name(team_name).await
    }

    /// All members of a team.
    #[instrument(skip_all, fields(team = %team_name))]
    pub async fn list_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError> {
        self.users.list_by_team(team_name).await
    }

    /// Active members of a team.
    ///
    /// Not routed over HTTP; kept so the service covers the full member
    /// store contract.
    #[instrument(skip_all, fields(team = %team_name))]
    pub async fn list_active_by_team(&self, team_name: &str) -> Result<Vec<User>, ReviewError> {
        let users = self.users.list_active_by_team(team_name).await?;
        Ok(users.into_iter().filter(|u| u.is_active).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryRepository;
    use crate::services::random::mock::FirstChoice;
    use crate::services::test_support::service_with;
    use std::sync::Arc;

    fn member(id: &str, name: &str, active: bool) -> NewTeamMember {
        NewTeamMember {
            user_id: id.to_string(),
            username: name.to_string(),
            is_active: active,
        }
    }

    fn setup() -> (Arc<InMemoryRepository>, ReviewService) {
        let repo = Arc::new(InMemoryRepository::new());
        let service = service_with(&repo, Arc::new(FirstChoice));
        (repo, service)
    }

    #[tokio::test]
    async fn test_create_team_with_new_members() {
        let (repo, service) = setup();

        let team = service
            .create_team(
                "backend",
                vec![member("u1", "Alice", true), member("u2", "Bob", false)],
            )
            .await
            .unwrap();

        assert_eq!(team.team_name, "backend");
        let members = service.list_by_team("backend").await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(repo.user("u1").unwrap().username, "Alice");
        assert!(!repo.user("u2").unwrap().is_active);
    }

    #[tokio::test]
    async fn test_create_team_twice_keeps_first() {
        let (_, service) = setup();
        service
            .create_team("backend", vec![member("u1", "Alice", true)])
            .await
            .unwrap();

        let result = service
            .create_team("backend", vec![member("u9", "Zed", true)])
            .await;

        assert!(matches!(result, Err(ReviewError::TeamExists)));
        let members = service.list_by_team("backend").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_create_team_rejects_member_of_other_team() {
        let (repo, service) = setup();
        service
            .create_team("backend", vec![member("u1", "Alice", true)])
            .await
            .unwrap();

        let result = service
            .create_team(
                "frontend",
                vec![member("u2", "Bob", true), member("u1", "Alice", true)],
            )
            .await;

        assert!(matches!(result, Err(ReviewError::UserInAnotherTeam)));
        assert_eq!(
            repo.user("u1").unwrap().team_name.as_deref(),
            Some("backend")
        );
        // Earlier steps are not rolled back.
        assert!(service.get_team("frontend").await.is_ok());
        assert_eq!(
            repo.user("u2").unwrap().team_name.as_deref(),
            Some("frontend")
        );
    }

    #[tokio::test]
    async fn test_create_team_adopts_unassigned_user() {
        let (repo, service) = setup();
        repo.insert_user("u1", None, false);

        service
            .create_team("backend", vec![member("u1", "Alice", true)])
            .await
            .unwrap();

        let user = repo.user("u1").unwrap();
        assert_eq!(user.team_name.as_deref(), Some("backend"));
        assert_eq!(user.username, "Alice");
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_create_team_propagates_lookup_failure() {
        let repo = Arc::new(InMemoryRepository::failing());
        let service = service_with(&repo, Arc::new(FirstChoice));

        let result = service.create_team("backend", vec![]).await;

        assert!(matches!(result, Err(ReviewError::Database(_))));
    }

    #[tokio::test]
    async fn test_get_team_not_found() {
        let (_, service) = setup();

        let result = service.get_team("nobody").await;

        assert!(matches!(result, Err(ReviewError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_active_by_team() {
        let (_, service) = setup();
        service
            .create_team(
                "backend",
                vec![
                    member("u1", "Alice", true),
                    member("u2", "Bob", false),
                    member("u3", "Carol", true),
                ],
            )
            .await
            .unwrap();

        let active: Vec<String> = service
            .list_active_by_team("backend")
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_id)
            .collect();

        assert_eq!(active, vec!["u1", "u3"]);
    }
}
