use super::repo_tx_mysql::{downcast, is_dup_key};
use crate::application_port::AuthError;
use crate::domain_model::{ImageKind, UserId};
use crate::domain_port::{StorageTx, UserRecord, UserRepo};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<UserRecord, AuthError> {
        let get = |e: sqlx::Error| AuthError::Store(e.to_string());

        Ok(UserRecord {
            user_id: row.try_get("user_id").map_err(get)?,
            username: row.try_get("username").map_err(get)?,
            email: row.try_get("email").map_err(get)?,
            full_name: row.try_get("full_name").map_err(get)?,
            avatar_url: row.try_get("avatar_url").map_err(get)?,
            cover_image_url: row.try_get("cover_image_url").map_err(get)?,
            is_active: row.try_get("is_active").map_err(get)?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(get)?,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        email: &str,
        full_name: &str,
    ) -> Result<(), AuthError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO user (user_id, username, email, full_name, is_active)
VALUES (?, ?, ?, ?, ?)
"#,
        )
        .bind(user_id)
        .bind(username)
        .bind(email)
        .bind(full_name)
        .bind(true)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, username, email, full_name, avatar_url, cover_image_url, is_active, created_at
FROM user
WHERE user_id = ?
"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
UPDATE user
SET full_name = COALESCE(?, full_name),
    email = COALESCE(?, email)
WHERE user_id = ?
"#,
        )
        .bind(full_name)
        .bind(email)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        if result.rows_affected() == 0 && !self.id_exists(user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }

    async fn set_image_url(
        &self,
        user_id: UserId,
        kind: ImageKind,
        url: &str,
    ) -> Result<(), AuthError> {
        let sql = match kind {
            ImageKind::Avatar => "UPDATE user SET avatar_url = ? WHERE user_id = ?",
            ImageKind::CoverImage => "UPDATE user SET cover_image_url = ? WHERE user_id = ?",
        };

        let result = sqlx::query(sql)
            .bind(url)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        if result.rows_affected() == 0 && !self.id_exists(user_id).await? {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM user WHERE username = ?"#)
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM user WHERE email = ?"#)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(1)
FROM user
WHERE user_id = ?
"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }
}
