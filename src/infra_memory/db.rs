use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// One row per subject; the repos and the session store are views over the
/// same map. DashMap's per-shard locking gives the per-subject write
/// serialization the session store contract asks for.
pub struct MemoryDb {
    pub(crate) users: DashMap<UserId, MemoryUserRow>,
}

#[derive(Debug, Clone)]
pub(crate) struct MemoryUserRow {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub refresh_token: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl MemoryDb {
    pub fn shared() -> Arc<Self> {
        Arc::new(MemoryDb {
            users: DashMap::new(),
        })
    }
}
