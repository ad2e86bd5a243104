//! Storage seam between the control channel and the database.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::core::time::primitive_now_utc;
use crate::db::models::FlaggedActivity;
use crate::db::types::{SessionStatus, UserRole};
use crate::repositories::{sessions, sessions::StatusUpdate, users};

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredUser {
    pub(crate) id: String,
    pub(crate) role: UserRole,
}

#[async_trait]
pub(crate) trait SessionStore: Send + Sync {
    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError>;

    /// Applies a status change subject to the terminal guard.
    async fn update_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<StatusUpdate, StoreError>;

    /// Returns false when the session does not exist.
    async fn update_session_time(&self, session_id: &str, seconds: i32)
        -> Result<bool, StoreError>;

    /// Appends to the session's flagged-activity log; false when the session
    /// does not exist.
    async fn add_flagged_activity(
        &self,
        session_id: &str,
        activity: FlaggedActivity,
    ) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub(crate) struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StoreError> {
        let user = users::find_by_id(&self.pool, id).await?;
        Ok(user.map(|user| StoredUser { id: user.id, role: user.role }))
    }

    async fn update_session_status(
        &self,
        session_id: &str,
        status: SessionStatus,
    ) -> Result<StatusUpdate, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(sessions::update_status(&mut conn, session_id, status, primitive_now_utc()).await?)
    }

    async fn update_session_time(
        &self,
        session_id: &str,
        seconds: i32,
    ) -> Result<bool, StoreError> {
        Ok(sessions::update_time_remaining(&self.pool, session_id, seconds).await?)
    }

    async fn add_flagged_activity(
        &self,
        session_id: &str,
        activity: FlaggedActivity,
    ) -> Result<bool, StoreError> {
        Ok(sessions::append_flagged_activity(&self.pool, session_id, &activity).await?)
    }
}
