use crate::application_port::AuthError;
use crate::domain_model::{ImageKind, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the API is allowed to see of a user. Never carries the password
/// hash or the refresh token.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn get_profile(&self, user_id: UserId) -> Result<UserProfile, AuthError>;
    async fn update_profile(
        &self,
        user_id: UserId,
        input: UpdateProfileInput,
    ) -> Result<UserProfile, AuthError>;
    /// Push image bytes to the media host and record the returned URL
    /// in the user's avatar or cover slot.
    async fn update_image(
        &self,
        user_id: UserId,
        kind: ImageKind,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UserProfile, AuthError>;
}
