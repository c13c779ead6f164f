use super::db::MemoryDb;
use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::{AuthCredentialsRecord, AuthRepo, StorageTx};
use std::sync::Arc;

pub struct MemoryAuthRepo {
    db: Arc<MemoryDb>,
}

impl MemoryAuthRepo {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        MemoryAuthRepo { db }
    }
}

#[async_trait::async_trait]
impl AuthRepo for MemoryAuthRepo {
    async fn create_credentials_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        _username: &str,
        _email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let mut row = self
            .db
            .users
            .get_mut(&user_id)
            .ok_or(AuthError::UserNotFound)?;
        row.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn get_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AuthCredentialsRecord>, AuthError> {
        Ok(self.db.users.iter().find_map(|entry| {
            let row = entry.value();
            if row.username == login || row.email == login {
                Some(AuthCredentialsRecord {
                    user_id: *entry.key(),
                    username: row.username.clone(),
                    email: row.email.clone(),
                    password_hash: row.password_hash.clone(),
                    is_active: row.is_active,
                    created_at: row.created_at,
                })
            } else {
                None
            }
        }))
    }

    async fn get_password_hash(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        Ok(self
            .db
            .users
            .get(&user_id)
            .map(|row| row.password_hash.clone()))
    }

    async fn set_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let mut row = self
            .db
            .users
            .get_mut(&user_id)
            .ok_or(AuthError::UserNotFound)?;
        row.password_hash = password_hash.to_string();
        Ok(())
    }
}
