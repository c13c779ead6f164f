use crate::application_port::AuthError;
use crate::domain_model::UserId;

/// Single refresh-token slot per subject, persisted on the credential row.
/// Issuing a new token overwrites the slot; there is no session table.
///
/// The replay guard in the rotation protocol does get / compare / set without
/// holding a lock, so the backing store must serialize writes per subject key
/// (a row-level write is enough). A store that cannot is vulnerable to a
/// lost-update race between two rotations.
#[async_trait::async_trait]
pub trait AuthSessionStore: Send + Sync {
    /// `None` covers both a cleared slot and an unknown subject.
    async fn get_refresh_token(&self, user_id: UserId) -> Result<Option<String>, AuthError>;
    /// Overwrite the slot; `None` clears it. Fails `UserNotFound` when the
    /// subject row does not exist.
    async fn set_refresh_token(
        &self,
        user_id: UserId,
        token: Option<&str>,
    ) -> Result<(), AuthError>;
}
