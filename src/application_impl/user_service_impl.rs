use crate::application_port::{AuthError, UpdateProfileInput, UserProfile, UserService};
use crate::domain_model::{ImageKind, UserId};
use crate::domain_port::{MediaStore, UserRecord, UserRepo};
use crate::logger::*;
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
    media_store: Arc<dyn MediaStore>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>, media_store: Arc<dyn MediaStore>) -> RealUserService {
        RealUserService {
            user_repo,
            media_store,
        }
    }

    fn to_profile(record: UserRecord) -> UserProfile {
        UserProfile {
            user_id: record.user_id,
            username: record.username,
            email: record.email,
            full_name: record.full_name,
            avatar_url: record.avatar_url,
            cover_image_url: record.cover_image_url,
            created_at: record.created_at,
        }
    }

    async fn load_profile(&self, user_id: UserId) -> Result<UserProfile, AuthError> {
        let record = self
            .user_repo
            .get(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(Self::to_profile(record))
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn get_profile(&self, user_id: UserId) -> Result<UserProfile, AuthError> {
        self.load_profile(user_id).await
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        input: UpdateProfileInput,
    ) -> Result<UserProfile, AuthError> {
        if input.full_name.is_none() && input.email.is_none() {
            return Err(AuthError::InvalidInput("nothing to update".to_string()));
        }
        if let Some(full_name) = &input.full_name {
            if full_name.trim().is_empty() {
                return Err(AuthError::InvalidInput("full_name is required".to_string()));
            }
        }
        if let Some(email) = &input.email {
            if !email.contains('@') {
                return Err(AuthError::InvalidInput("email is not valid".to_string()));
            }
        }

        self.user_repo
            .update_profile(user_id, input.full_name.as_deref(), input.email.as_deref())
            .await?;

        self.load_profile(user_id).await
    }

    async fn update_image(
        &self,
        user_id: UserId,
        kind: ImageKind,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<UserProfile, AuthError> {
        if bytes.is_empty() {
            return Err(AuthError::InvalidInput("image file is required".to_string()));
        }
        if !self.user_repo.id_exists(user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        let url = self
            .media_store
            .upload_image(bytes, content_type)
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        debug!(%user_id, kind = kind.as_str(), %url, "image uploaded");

        self.user_repo.set_image_url(user_id, kind, &url).await?;

        self.load_profile(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_port::StorageTx;
    use crate::infra_memory::{MemoryDb, MemoryMediaStore, MemoryTx, MemoryUserRepo};
    use uuid::Uuid;

    async fn seeded_service() -> (RealUserService, UserId) {
        let db = MemoryDb::shared();
        let repo = MemoryUserRepo::new(db.clone());
        let user_id = UserId(Uuid::new_v4());
        let mut tx: Box<dyn StorageTx<'_>> = Box::new(MemoryTx);
        repo.create_in_tx(tx.as_mut(), user_id, "alice", "alice@example.com", "Alice")
            .await
            .unwrap();

        let service = RealUserService::new(
            Arc::new(MemoryUserRepo::new(db)),
            Arc::new(MemoryMediaStore),
        );
        (service, user_id)
    }

    #[tokio::test]
    async fn profile_round_trip() {
        let (service, user_id) = seeded_service().await;

        let profile = service.get_profile(user_id).await.unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.avatar_url, None);

        let updated = service
            .update_profile(
                user_id,
                UpdateProfileInput {
                    full_name: Some("Alice A.".to_string()),
                    email: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.full_name, "Alice A.");
        assert_eq!(updated.email, "alice@example.com");
    }

    #[tokio::test]
    async fn empty_patch_is_rejected() {
        let (service, user_id) = seeded_service().await;

        assert!(matches!(
            service
                .update_profile(user_id, UpdateProfileInput::default())
                .await
                .unwrap_err(),
            AuthError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn image_upload_records_url() {
        let (service, user_id) = seeded_service().await;

        let profile = service
            .update_image(user_id, ImageKind::Avatar, vec![0xFF, 0xD8, 0xFF], "image/jpeg")
            .await
            .unwrap();
        let avatar = profile.avatar_url.expect("avatar url set");
        assert!(avatar.starts_with("memory://media/"));
        assert_eq!(profile.cover_image_url, None);

        let profile = service
            .update_image(user_id, ImageKind::CoverImage, vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert!(profile.cover_image_url.is_some());
        assert_eq!(profile.avatar_url.as_deref(), Some(avatar.as_str()));
    }

    #[tokio::test]
    async fn unknown_user_and_empty_file_fail() {
        let (service, _user_id) = seeded_service().await;

        assert!(matches!(
            service
                .update_image(UserId(Uuid::new_v4()), ImageKind::Avatar, vec![1], "image/png")
                .await
                .unwrap_err(),
            AuthError::UserNotFound
        ));

        let (service, user_id) = seeded_service().await;
        assert!(matches!(
            service
                .update_image(user_id, ImageKind::Avatar, vec![], "image/png")
                .await
                .unwrap_err(),
            AuthError::InvalidInput(_)
        ));
    }
}
