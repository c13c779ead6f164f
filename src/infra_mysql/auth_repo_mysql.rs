use super::repo_tx_mysql::{downcast, is_dup_key};
use crate::application_port::AuthError;
use crate::domain_model::UserId;
use crate::domain_port::{AuthCredentialsRecord, AuthRepo, StorageTx};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

pub struct MySqlAuthRepo {
    pool: MySqlPool,
}

impl MySqlAuthRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlAuthRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<AuthCredentialsRecord, AuthError> {
        let user_id: UserId = row
            .try_get("user_id")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let username: String = row
            .try_get("username")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let is_active: bool = row
            .try_get("is_active")
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(AuthCredentialsRecord {
            user_id,
            username,
            email,
            password_hash,
            is_active,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl AuthRepo for MySqlAuthRepo {
    async fn create_credentials_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO auth_credential (user_id, username, email, password_hash)
VALUES (?, ?, ?, ?)
"#,
        )
        .bind(user_id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
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

    async fn get_by_login(
        &self,
        login: &str,
    ) -> Result<Option<AuthCredentialsRecord>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, username, email, password_hash, is_active, created_at
FROM auth_credential
WHERE username = ? OR email = ?
"#,
        )
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn get_password_hash(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM auth_credential WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(hash)
    }

    async fn set_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE auth_credential SET password_hash = ? WHERE user_id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}
