use crate::application_port::{
    AccessToken, AuthError, AuthService, AuthTokens, ChangePasswordInput, CredentialHasher,
    LoginInput, LoginResult, RefreshToken, SignupInput, TokenCodec, TokenError, TokenKind,
};
use crate::domain_model::UserId;
use crate::domain_port::{AuthRepo, AuthSessionStore, TxManager, UserRepo};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let argon2 = argon2::Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash).map_err(|e| {
            AuthError::InternalError(format!("invalid PHC hash: {}", e.to_string()))
        })?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!(
                "verify error: {}",
                e.to_string()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

impl TokenConfig {
    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => &self.access_secret,
            TokenKind::Refresh => &self.refresh_secret,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String, // user id as string
    kind: TokenKind,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

fn encode_token(
    uid: UserId,
    kind: TokenKind,
    cfg: &TokenConfig,
) -> Result<(String, DateTime<Utc>), TokenError> {
    let iat_dt = Utc::now();
    let exp_dt = iat_dt + cfg.ttl(kind);
    let claims = TokenClaims {
        sub: uid.0.to_string(),
        kind,
        exp: exp_dt.timestamp(),
        iat: iat_dt.timestamp(),
        iss: cfg.issuer.clone(),
        aud: cfg.audience.clone(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.secret(kind)),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))?;
    Ok((token, exp_dt))
}

fn decode_token(token: &str, kind: TokenKind, cfg: &TokenConfig) -> Result<TokenClaims, TokenError> {
    let mut v = Validation::new(Algorithm::HS256);
    v.validate_exp = true;
    v.leeway = 0; // expiry is exact; a zero-ttl token does not verify
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(cfg.secret(kind)), &v)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        })?;
    // Per-kind secrets already reject cross-kind tokens at the signature
    // check; the claim comparison keeps that true even if both secrets
    // are misconfigured to the same value.
    if data.claims.kind != kind {
        return Err(TokenError::InvalidSignature);
    }
    Ok(data.claims)
}

/// HS256 codec over two independent secrets, one per token kind.
pub struct HsTokenCodec {
    cfg: TokenConfig,
}

impl HsTokenCodec {
    pub fn new(cfg: TokenConfig) -> Self {
        HsTokenCodec { cfg }
    }

    #[inline]
    fn parse_user_id(sub: &str) -> Result<UserId, TokenError> {
        let id = sub.parse::<UserId>().map_err(|_| TokenError::Malformed)?;
        Ok(id)
    }
}

#[async_trait::async_trait]
impl TokenCodec for HsTokenCodec {
    async fn issue(
        &self,
        user: UserId,
        kind: TokenKind,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        encode_token(user, kind, &self.cfg)
    }

    async fn verify(&self, token: &str, kind: TokenKind) -> Result<UserId, TokenError> {
        let claims = decode_token(token, kind, &self.cfg)?;
        Self::parse_user_id(&claims.sub)
    }
}

pub struct RealAuthService {
    auth_repo: Arc<dyn AuthRepo>,
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    session_store: Arc<dyn AuthSessionStore>,
    tx_manager: Arc<dyn TxManager>,
    min_username_len: usize,
    min_password_len: usize,
}

impl RealAuthService {
    pub fn new(
        auth_repo: Arc<dyn AuthRepo>,
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        session_store: Arc<dyn AuthSessionStore>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            auth_repo,
            user_repo,
            credential_hasher,
            token_codec,
            session_store,
            tx_manager,
            min_username_len: 3,
            min_password_len: 8,
        }
    }

    fn validate_signup(&self, request: &SignupInput) -> Result<(), AuthError> {
        for (field, value) in [
            ("username", &request.username),
            ("email", &request.email),
            ("full_name", &request.full_name),
            ("password", &request.password),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::InvalidInput(format!("{field} is required")));
            }
        }
        if request.username.len() < self.min_username_len {
            return Err(AuthError::InvalidInput("username too short".to_string()));
        }
        if request.password.len() < self.min_password_len {
            return Err(AuthError::InvalidInput("password too short".to_string()));
        }
        if !request.email.contains('@') {
            return Err(AuthError::InvalidInput("email is not valid".to_string()));
        }
        Ok(())
    }

    #[inline]
    fn new_user_id() -> UserId {
        UserId(Uuid::new_v4())
    }

    async fn issue_pair(&self, user_id: UserId) -> Result<AuthTokens, AuthError> {
        let (access_token, access_exp) = self
            .token_codec
            .issue(user_id, TokenKind::Access)
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let (refresh_token, refresh_exp) = self
            .token_codec
            .issue(user_id, TokenKind::Refresh)
            .await
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        Ok(AuthTokens {
            access_token: AccessToken(access_token),
            refresh_token: RefreshToken(refresh_token),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        self.validate_signup(&request)?;
        let SignupInput {
            username,
            email,
            full_name,
            password,
        } = request;
        let username = username.to_lowercase();

        if self.user_repo.username_exists(&username).await? {
            return Err(AuthError::UserExists);
        }
        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::UserExists);
        }

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let user_id = Self::new_user_id();

        self.user_repo
            .create_in_tx(tx.as_mut(), user_id, &username, &email, &full_name)
            .await?;

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        self.auth_repo
            .create_credentials_in_tx(tx.as_mut(), user_id, &username, &email, &password_hash)
            .await?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(user_id)
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { login, password } = request;

        let rec = self
            .auth_repo
            .get_by_login(&login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !rec.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let ok = self
            .credential_hasher
            .verify_password(&password, &rec.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(rec.user_id).await?;

        // Single slot per subject: any prior session is silently invalidated.
        self.session_store
            .set_refresh_token(rec.user_id, Some(&tokens.refresh_token.0))
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(LoginResult {
            user_id: rec.user_id,
            tokens,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let user_id = self
            .token_codec
            .verify(token, TokenKind::Access)
            .await
            .map_err(|_| AuthError::Unauthorized)?;

        let exists = self
            .user_repo
            .id_exists(user_id)
            .await
            .map_err(|_| AuthError::Unauthorized)?;
        if !exists {
            return Err(AuthError::Unauthorized);
        }

        Ok(user_id)
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        // Every failure mode below surfaces as the same Unauthorized so the
        // endpoint is not an oracle for which check rejected the token.
        let user_id = self
            .token_codec
            .verify(refresh_token, TokenKind::Refresh)
            .await
            .map_err(|_| AuthError::Unauthorized)?;

        let stored = self
            .session_store
            .get_refresh_token(user_id)
            .await
            .map_err(|_| AuthError::Unauthorized)?;

        // Byte-for-byte match against the stored slot. A superseded token
        // necessarily differs, which is the replay defense: of two racing
        // rotations on the same stale token, only the first passes here.
        match stored.as_deref() {
            Some(current) if current == refresh_token => {}
            _ => return Err(AuthError::Unauthorized),
        }

        let tokens = self.issue_pair(user_id).await?;

        self.session_store
            .set_refresh_token(user_id, Some(&tokens.refresh_token.0))
            .await
            .map_err(|_| AuthError::Unauthorized)?;

        Ok(tokens)
    }

    async fn logout(&self, user_id: UserId) -> Result<(), AuthError> {
        // Outstanding access tokens stay valid until they expire; only the
        // refresh slot is cleared.
        match self.session_store.set_refresh_token(user_id, None).await {
            Ok(()) => Ok(()),
            Err(AuthError::UserNotFound) => Ok(()),
            Err(e) => Err(AuthError::Store(e.to_string())),
        }
    }

    async fn change_password(
        &self,
        user_id: UserId,
        request: ChangePasswordInput,
    ) -> Result<(), AuthError> {
        if request.new_password.len() < self.min_password_len {
            return Err(AuthError::InvalidInput("password too short".to_string()));
        }

        let current_hash = self
            .auth_repo
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let ok = self
            .credential_hasher
            .verify_password(&request.old_password, &current_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self
            .credential_hasher
            .hash_password(&request.new_password)
            .await?;
        self.auth_repo.set_password_hash(user_id, &new_hash).await?;

        // The refresh slot and any unexpired access tokens are left alone;
        // the short access TTL bounds their remaining lifetime.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::{
        MemoryAuthRepo, MemoryAuthSessionStore, MemoryDb, MemoryTxManager, MemoryUserRepo,
    };

    fn test_config(access_ttl: Duration) -> TokenConfig {
        TokenConfig {
            issuer: "cadenza.test".to_string(),
            audience: "cadenza-client".to_string(),
            access_ttl,
            refresh_ttl: Duration::from_secs(7200),
            access_secret: b"access-test-secret-at-least-32-ch".to_vec(),
            refresh_secret: b"refresh-test-secret-at-least-32-c".to_vec(),
        }
    }

    fn test_codec() -> HsTokenCodec {
        HsTokenCodec::new(test_config(Duration::from_secs(3600)))
    }

    fn test_user() -> UserId {
        UserId(Uuid::new_v4())
    }

    #[tokio::test]
    async fn round_trip_returns_subject() {
        let codec = test_codec();
        let uid = test_user();

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let (token, exp) = codec.issue(uid, kind).await.unwrap();
            assert!(exp > Utc::now());
            assert_eq!(codec.verify(&token, kind).await.unwrap(), uid);
        }
    }

    #[tokio::test]
    async fn cross_kind_is_rejected() {
        let codec = test_codec();
        let uid = test_user();

        let (access, _) = codec.issue(uid, TokenKind::Access).await.unwrap();
        let (refresh, _) = codec.issue(uid, TokenKind::Refresh).await.unwrap();

        assert_eq!(
            codec.verify(&access, TokenKind::Refresh).await.unwrap_err(),
            TokenError::InvalidSignature
        );
        assert_eq!(
            codec.verify(&refresh, TokenKind::Access).await.unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[tokio::test]
    async fn tampered_and_garbage_tokens_are_rejected() {
        let codec = test_codec();
        let (token, _) = codec.issue(test_user(), TokenKind::Access).await.unwrap();

        // Flip the leading character of the signature segment; the token
        // still parses but no longer verifies.
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut tampered = token[..sig_start].to_string();
        let first = token[sig_start..].chars().next().unwrap();
        tampered.push(if first == 'A' { 'B' } else { 'A' });
        tampered.push_str(&token[sig_start + 1..]);
        assert_eq!(
            codec
                .verify(&tampered, TokenKind::Access)
                .await
                .unwrap_err(),
            TokenError::InvalidSignature
        );

        assert_eq!(
            codec
                .verify("not-a-token", TokenKind::Access)
                .await
                .unwrap_err(),
            TokenError::Malformed
        );
    }

    #[tokio::test]
    async fn zero_ttl_token_expires() {
        let codec = HsTokenCodec::new(test_config(Duration::from_secs(0)));
        let (token, _) = codec.issue(test_user(), TokenKind::Access).await.unwrap();

        // exp == iat; one second later the token is past its boundary.
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            codec.verify(&token, TokenKind::Access).await.unwrap_err(),
            TokenError::Expired
        );
    }

    fn make_service() -> RealAuthService {
        let db = MemoryDb::shared();
        RealAuthService::new(
            Arc::new(MemoryAuthRepo::new(db.clone())),
            Arc::new(MemoryUserRepo::new(db.clone())),
            Arc::new(Argon2PasswordHasher),
            Arc::new(test_codec()),
            Arc::new(MemoryAuthSessionStore::new(db.clone())),
            Arc::new(MemoryTxManager),
        )
    }

    fn signup_input(username: &str) -> SignupInput {
        SignupInput {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            full_name: format!("{username} tester"),
            password: "correct horse".to_string(),
        }
    }

    async fn signed_up_and_logged_in(service: &RealAuthService, username: &str) -> LoginResult {
        service.signup(signup_input(username)).await.unwrap();
        service
            .login(LoginInput {
                login: username.to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_then_verify_access_returns_subject() {
        let service = make_service();
        let result = signed_up_and_logged_in(&service, "alice").await;

        let uid = service
            .verify_token(&result.tokens.access_token.0)
            .await
            .unwrap();
        assert_eq!(uid, result.user_id);
    }

    #[tokio::test]
    async fn login_by_email_works() {
        let service = make_service();
        service.signup(signup_input("bob")).await.unwrap();

        let result = service
            .login(LoginInput {
                login: "bob@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(
            service
                .verify_token(&result.tokens.access_token.0)
                .await
                .unwrap(),
            result.user_id
        );
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_replay() {
        let service = make_service();
        let first = signed_up_and_logged_in(&service, "carol").await;
        let r1 = first.tokens.refresh_token.0.clone();

        let second = service.refresh_token(&r1).await.unwrap();
        let r2 = second.refresh_token.0.clone();
        assert_ne!(r1, r2);

        // The stale token lost its slot to r2.
        assert!(matches!(
            service.refresh_token(&r1).await.unwrap_err(),
            AuthError::Unauthorized
        ));

        // The current token still rotates.
        let third = service.refresh_token(&r2).await.unwrap();
        assert_ne!(second.refresh_token.0, third.refresh_token.0);
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens() {
        let service = make_service();
        let result = signed_up_and_logged_in(&service, "dave").await;

        assert!(matches!(
            service
                .refresh_token(&result.tokens.access_token.0)
                .await
                .unwrap_err(),
            AuthError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn logout_then_refresh_fails() {
        let service = make_service();
        let result = signed_up_and_logged_in(&service, "erin").await;

        service.logout(result.user_id).await.unwrap();
        // Idempotent: a second logout is not an error.
        service.logout(result.user_id).await.unwrap();

        assert!(matches!(
            service
                .refresh_token(&result.tokens.refresh_token.0)
                .await
                .unwrap_err(),
            AuthError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn second_login_invalidates_previous_refresh_token() {
        let service = make_service();
        let first = signed_up_and_logged_in(&service, "frank").await;

        let second = service
            .login(LoginInput {
                login: "frank".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            service
                .refresh_token(&first.tokens.refresh_token.0)
                .await
                .unwrap_err(),
            AuthError::Unauthorized
        ));
        service
            .refresh_token(&second.tokens.refresh_token.0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn refresh_for_unknown_subject_fails() {
        let service = make_service();
        let codec = test_codec();
        // Well-signed token for a subject that was never created.
        let (token, _) = codec.issue(test_user(), TokenKind::Refresh).await.unwrap();

        assert!(matches!(
            service.refresh_token(&token).await.unwrap_err(),
            AuthError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn signup_rejects_duplicates_and_empty_fields() {
        let service = make_service();
        service.signup(signup_input("grace")).await.unwrap();

        assert!(matches!(
            service.signup(signup_input("grace")).await.unwrap_err(),
            AuthError::UserExists
        ));

        let mut empty = signup_input("heidi");
        empty.full_name = "  ".to_string();
        assert!(matches!(
            service.signup(empty).await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn change_password_requires_old_password() {
        let service = make_service();
        let result = signed_up_and_logged_in(&service, "ivan").await;

        assert!(matches!(
            service
                .change_password(
                    result.user_id,
                    ChangePasswordInput {
                        old_password: "wrong horse".to_string(),
                        new_password: "battery staple".to_string(),
                    },
                )
                .await
                .unwrap_err(),
            AuthError::InvalidCredentials
        ));

        service
            .change_password(
                result.user_id,
                ChangePasswordInput {
                    old_password: "correct horse".to_string(),
                    new_password: "battery staple".to_string(),
                },
            )
            .await
            .unwrap();

        // The session issued before the change still rotates.
        service
            .refresh_token(&result.tokens.refresh_token.0)
            .await
            .unwrap();

        service
            .login(LoginInput {
                login: "ivan".to_string(),
                password: "battery staple".to_string(),
            })
            .await
            .unwrap();
    }
}
