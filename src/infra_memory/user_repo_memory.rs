use super::db::{MemoryDb, MemoryUserRow};
use crate::application_port::AuthError;
use crate::domain_model::{ImageKind, UserId};
use crate::domain_port::{StorageTx, UserRecord, UserRepo};
use chrono::Utc;
use std::sync::Arc;

pub struct MemoryUserRepo {
    db: Arc<MemoryDb>,
}

impl MemoryUserRepo {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        MemoryUserRepo { db }
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> Result<(), AuthError> {
        self.db.users.insert(
            user_id,
            MemoryUserRow {
                username: username.to_string(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                password_hash: String::new(),
                avatar_url: None,
                cover_image_url: None,
                refresh_token: None,
                is_active: true,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.db.users.get(&user_id).map(|row| UserRecord {
            user_id,
            username: row.username.clone(),
            email: row.email.clone(),
            full_name: row.full_name.clone(),
            avatar_url: row.avatar_url.clone(),
            cover_image_url: row.cover_image_url.clone(),
            is_active: row.is_active,
            created_at: row.created_at,
        }))
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AuthError> {
        let mut row = self
            .db
            .users
            .get_mut(&user_id)
            .ok_or(AuthError::UserNotFound)?;
        if let Some(full_name) = full_name {
            row.full_name = full_name.to_string();
        }
        if let Some(email) = email {
            row.email = email.to_string();
        }
        Ok(())
    }

    async fn set_image_url(
        &self,
        user_id: UserId,
        kind: ImageKind,
        url: &str,
    ) -> Result<(), AuthError> {
        let mut row = self
            .db
            .users
            .get_mut(&user_id)
            .ok_or(AuthError::UserNotFound)?;
        match kind {
            ImageKind::Avatar => row.avatar_url = Some(url.to_string()),
            ImageKind::CoverImage => row.cover_image_url = Some(url.to_string()),
        }
        Ok(())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self
            .db
            .users
            .iter()
            .any(|row| row.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.db.users.iter().any(|row| row.email == email))
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.db.users.contains_key(&user_id))
    }
}
