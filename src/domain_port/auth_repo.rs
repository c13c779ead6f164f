use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct AuthCredentialsRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait AuthRepo: Send + Sync {
    /// Insert a row. The `user_id` row must already exist (FK).
    async fn create_credentials_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError>;

    /// Fetch credentials by username or email (for login).
    async fn get_by_login(&self, login: &str)
    -> Result<Option<AuthCredentialsRecord>, AuthError>;

    async fn get_password_hash(&self, user_id: UserId) -> Result<Option<String>, AuthError>;

    async fn set_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), AuthError>;
}
