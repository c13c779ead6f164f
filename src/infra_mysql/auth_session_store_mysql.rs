use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::AuthSessionStore;
use sqlx::MySqlPool;

/// The refresh slot is a nullable column on the credential row, so the
/// row-level write lock is what serializes rotations per subject.
pub struct MySqlAuthSessionStore {
    pool: MySqlPool,
}

impl MySqlAuthSessionStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAuthSessionStore { pool }
    }

    async fn credential_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM auth_credential WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }
}

#[async_trait::async_trait]
impl AuthSessionStore for MySqlAuthSessionStore {
    async fn get_refresh_token(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        let slot: Option<Option<String>> =
            sqlx::query_scalar("SELECT refresh_token FROM auth_credential WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(slot.flatten())
    }

    async fn set_refresh_token(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE auth_credential SET refresh_token = ? WHERE user_id = ?")
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        // Zero affected rows also happens when the slot already holds this
        // value (MySQL reports changed rows), so check the row itself.
        if result.rows_affected() == 0 && !self.credential_exists(user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}
