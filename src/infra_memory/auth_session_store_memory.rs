use super::db::MemoryDb;
use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::AuthSessionStore;
use std::sync::Arc;

pub struct MemoryAuthSessionStore {
    db: Arc<MemoryDb>,
}

impl MemoryAuthSessionStore {
    pub fn new(db: Arc<MemoryDb>) -> Self {
        MemoryAuthSessionStore { db }
    }
}

#[async_trait::async_trait]
impl AuthSessionStore for MemoryAuthSessionStore {
    async fn get_refresh_token(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        Ok(self
            .db
            .users
            .get(&user_id)
            .and_then(|row| row.refresh_token.clone()))
    }

    async fn set_refresh_token(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<(), AuthError> {
        // get_mut holds the shard lock for the write, so two rotations on
        // the same subject cannot interleave here.
        match self.db.users.get_mut(&user_id) {
            Some(mut row) => {
                row.refresh_token = token.map(str::to_string);
                Ok(())
            }
            None => Err(AuthError::UserNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::db::MemoryUserRow;
    use chrono::Utc;
    use uuid::Uuid;

    fn db_with_user(user_id: UserId) -> Arc<MemoryDb> {
        let db = MemoryDb::shared();
        db.users.insert(
            user_id,
            MemoryUserRow {
                username: "u".to_string(),
                email: "u@example.com".to_string(),
                full_name: "U".to_string(),
                password_hash: String::new(),
                avatar_url: None,
                cover_image_url: None,
                refresh_token: None,
                is_active: true,
                created_at: Utc::now(),
            },
        );
        db
    }

    #[tokio::test]
    async fn slot_overwrites_and_clears() {
        let uid = UserId(Uuid::new_v4());
        let store = MemoryAuthSessionStore::new(db_with_user(uid));

        assert_eq!(store.get_refresh_token(uid).await.unwrap(), None);

        store.set_refresh_token(uid, Some("r1")).await.unwrap();
        assert_eq!(
            store.get_refresh_token(uid).await.unwrap().as_deref(),
            Some("r1")
        );

        store.set_refresh_token(uid, Some("r2")).await.unwrap();
        assert_eq!(
            store.get_refresh_token(uid).await.unwrap().as_deref(),
            Some("r2")
        );

        store.set_refresh_token(uid, None).await.unwrap();
        assert_eq!(store.get_refresh_token(uid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_subject_reads_none_and_fails_writes() {
        let store = MemoryAuthSessionStore::new(MemoryDb::shared());
        let uid = UserId(Uuid::new_v4());

        assert_eq!(store.get_refresh_token(uid).await.unwrap(), None);
        assert!(matches!(
            store.set_refresh_token(uid, Some("r1")).await.unwrap_err(),
            AuthError::UserNotFound
        ));
    }
}
