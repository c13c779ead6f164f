//! End-to-end walk through the session lifecycle over the in-memory
//! infrastructure: one subject, one refresh slot, rotation on every refresh.

use cadenza::application_impl::{Argon2PasswordHasher, HsTokenCodec, RealAuthService, TokenConfig};
use cadenza::application_port::{AuthError, AuthService, LoginInput, SignupInput};
use cadenza::infra_memory::{
    MemoryAuthRepo, MemoryAuthSessionStore, MemoryDb, MemoryTxManager, MemoryUserRepo,
};
use std::sync::Arc;
use std::time::Duration;

fn make_service() -> RealAuthService {
    let db = MemoryDb::shared();
    let codec = HsTokenCodec::new(TokenConfig {
        issuer: "cadenza.test".to_string(),
        audience: "cadenza-client".to_string(),
        access_ttl: Duration::from_secs(900),
        refresh_ttl: Duration::from_secs(864000),
        access_secret: b"integration-access-secret-32-byte".to_vec(),
        refresh_secret: b"integration-refresh-secret-32-by.".to_vec(),
    });
    RealAuthService::new(
        Arc::new(MemoryAuthRepo::new(db.clone())),
        Arc::new(MemoryUserRepo::new(db.clone())),
        Arc::new(Argon2PasswordHasher),
        Arc::new(codec),
        Arc::new(MemoryAuthSessionStore::new(db)),
        Arc::new(MemoryTxManager),
    )
}

#[tokio::test]
async fn session_lifecycle() {
    let service = make_service();

    service
        .signup(SignupInput {
            username: "userone".to_string(),
            email: "u1@example.com".to_string(),
            full_name: "User One".to_string(),
            password: "a long password".to_string(),
        })
        .await
        .unwrap();

    // Login -> (A1, R1)
    let login = service
        .login(LoginInput {
            login: "userone".to_string(),
            password: "a long password".to_string(),
        })
        .await
        .unwrap();
    let a1 = login.tokens.access_token.0.clone();
    let r1 = login.tokens.refresh_token.0.clone();

    assert_eq!(service.verify_token(&a1).await.unwrap(), login.user_id);

    // Refresh(R1) -> (A2, R2); the slot now holds R2.
    let second = service.refresh_token(&r1).await.unwrap();
    let r2 = second.refresh_token.0.clone();
    assert_eq!(
        service
            .verify_token(&second.access_token.0)
            .await
            .unwrap(),
        login.user_id
    );

    // Refresh(R1) again -> rejected, R1 was superseded.
    assert!(matches!(
        service.refresh_token(&r1).await.unwrap_err(),
        AuthError::Unauthorized
    ));

    // Refresh(R2) -> (A3, R3); the chain continues from the current token.
    let third = service.refresh_token(&r2).await.unwrap();
    let r3 = third.refresh_token.0.clone();
    assert_ne!(r2, r3);

    // Logout clears the slot; the freshest refresh token dies with it.
    service.logout(login.user_id).await.unwrap();
    assert!(matches!(
        service.refresh_token(&r3).await.unwrap_err(),
        AuthError::Unauthorized
    ));

    // Access tokens are not revoked by logout; the short TTL bounds them.
    assert_eq!(service.verify_token(&a1).await.unwrap(), login.user_id);
}
