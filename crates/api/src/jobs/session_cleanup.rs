//! Removes expired and revoked admin sessions.

use chrono::{Duration, Utc};
use persistence::repositories::UserRepository;
use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};

/// Sessions are kept this long after expiry or revocation.
const RETENTION_DAYS: i64 = 7;

pub struct SessionCleanupJob {
    users: UserRepository,
}

impl SessionCleanupJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Daily
    }

    async fn execute(&self) -> Result<(), String> {
        let before = Utc::now() - Duration::days(RETENTION_DAYS);
        let deleted = self
            .users
            .delete_stale_sessions(before)
            .await
            .map_err(|e| format!("Failed to delete stale sessions: {}", e))?;
        if deleted > 0 {
            tracing::info!(deleted, "Stale admin sessions removed");
        }
        Ok(())
    }
}
