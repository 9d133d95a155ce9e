//! User operations.

use crate::errors::ReviewError;
use crate::models::User;
use crate::services::ReviewService;
use tracing::instrument;

impl ReviewService {
    /// Look up a user.
    ///
    /// # Errors
    ///
    /// - `ReviewError::NotFound` - User does not exist
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: &str) -> Result<User, ReviewError> {
        self.users.get_by_id(user_id).await
    }

    /// Set whether a user can be picked as a reviewer.
    ///
    /// Existing assignments are not touched.
    ///
    /// # Errors
    ///
    /// - `ReviewError::NotFound` - User does not exist
    #[instrument(skip_all, fields(user_id = %user_id, is_active = is_active))]
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User, ReviewError> {
        let mut user = self.users.get_by_id(user_id).await?;
        user.is_active = is_active;

        let updated = self.users.update(&user).await?;

        tracing::info!(
            target: "review.service.users",
            user_id = %user_id,
            is_active = is_active,
            "User activity updated"
        );

        Ok(updated)
    }
}
