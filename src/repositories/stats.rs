use sqlx::PgPool;

use crate::db::types::{ExamStatus, SessionStatus};

#[derive(Debug, Clone, Copy)]
pub(crate) struct SystemCounts {
    pub(crate) total_users: i64,
    pub(crate) active_exams: i64,
    pub(crate) completed_sessions: i64,
    pub(crate) total_sessions: i64,
    pub(crate) flagged_sessions: i64,
}

pub(crate) async fn system_counts(pool: &PgPool) -> Result<SystemCounts, sqlx::Error> {
    let (total_users, active_exams, completed_sessions, total_sessions, flagged_sessions) =
        sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
            "SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM exams WHERE status = $1),
                (SELECT COUNT(*) FROM exam_sessions WHERE status = $2),
                (SELECT COUNT(*) FROM exam_sessions),
                (SELECT COUNT(*) FROM exam_sessions WHERE jsonb_array_length(flagged_activities) > 0)",
        )
        .bind(ExamStatus::Active)
        .bind(SessionStatus::Completed)
        .fetch_one(pool)
        .await?;

    Ok(SystemCounts {
        total_users,
        active_exams,
        completed_sessions,
        total_sessions,
        flagged_sessions,
    })
}

pub(crate) async fn database_reachable(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await.map(|_| ())
}
