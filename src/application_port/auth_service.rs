use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("unauthorized")]
    Unauthorized,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Codec-internal failure causes. Services collapse all of these to
/// `AuthError::Unauthorized` before they reach a caller, so the HTTP
/// surface never reveals which check rejected a token.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("signing error: {0}")]
    Signing(String),
}

/// Access and refresh tokens are signed with distinct secrets, so a leaked
/// access secret cannot mint refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    /// Username or email address.
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordInput {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    /// Sign a token of the given kind for `user`, expiring `ttl(kind)` from now.
    async fn issue(
        &self,
        user: UserId,
        kind: TokenKind,
    ) -> Result<(String, DateTime<Utc>), TokenError>;
    /// Check signature, expiry and kind; on success return the embedded subject.
    async fn verify(&self, token: &str, kind: TokenKind) -> Result<UserId, TokenError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    /// Verify an access token; used by request authorization, not the login flow.
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
    /// Exchange a refresh token for a new pair, invalidating the presented one.
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    /// Clear the refresh slot. Calling twice is not an error.
    async fn logout(&self, user_id: UserId) -> Result<(), AuthError>;
    async fn change_password(
        &self,
        user_id: UserId,
        request: ChangePasswordInput,
    ) -> Result<(), AuthError>;
}
