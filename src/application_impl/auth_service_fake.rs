use crate::application_port::*;
use crate::domain_model::UserId;
use chrono::{Duration, Utc};

#[derive(Debug)]
pub struct FakeAuthService;

impl FakeAuthService {
    pub fn new() -> Self {
        Self
    }
}

// Minimal fake implementation for basic use only.
// Extend to simulate more error cases and configurable responses when needed.
#[async_trait::async_trait]
impl AuthService for FakeAuthService {
    async fn signup(&self, request: SignupInput) -> Result<UserId, AuthError> {
        Ok(get_fake_id(&request.username))
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        Ok(LoginResult {
            user_id: get_fake_id(&request.login),
            tokens: get_fake_tokens(&request.login),
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        if let Some(login) = token.strip_prefix("fake-access-token:") {
            Ok(get_fake_id(login))
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        if let Some(login) = refresh_token.strip_prefix("fake-refresh-token:") {
            Ok(get_fake_tokens(login))
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    async fn logout(&self, _user_id: UserId) -> Result<(), AuthError> {
        Ok(())
    }

    async fn change_password(
        &self,
        _user_id: UserId,
        _request: ChangePasswordInput,
    ) -> Result<(), AuthError> {
        Ok(())
    }
}

fn get_fake_id(login: &str) -> UserId {
    UserId(uuid::Uuid::new_v5(
        &uuid::Uuid::NAMESPACE_OID,
        login.as_bytes(),
    ))
}

fn get_fake_tokens(login: &str) -> AuthTokens {
    let now = Utc::now();
    AuthTokens {
        access_token: AccessToken(format!("fake-access-token:{}", login)),
        access_token_expires_at: now + Duration::hours(1),
        refresh_token: RefreshToken(format!("fake-refresh-token:{}", login)),
        refresh_token_expires_at: now + Duration::days(7),
    }
}
