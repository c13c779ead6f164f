use crate::application_port::AuthError;
use crate::domain_model::{ImageKind, UserId};
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> Result<(), AuthError>;

    async fn get(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError>;

    /// Patch the given fields; `None` leaves a field untouched.
    async fn update_profile(
        &self,
        user_id: UserId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AuthError>;

    async fn set_image_url(
        &self,
        user_id: UserId,
        kind: ImageKind,
        url: &str,
    ) -> Result<(), AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError>;
}
