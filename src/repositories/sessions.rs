use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::db::models::{ExamSession, FlaggedActivity};
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, student_id, status, started_at, ended_at, time_remaining, \
    current_question_index, student_seed, device_info, ip_address, \
    flagged_activities, proctor_notes, created_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) time_remaining: i32,
    pub(crate) student_seed: &'a str,
    pub(crate) device_info: Option<serde_json::Value>,
    pub(crate) ip_address: Option<String>,
    pub(crate) now: time::PrimitiveDateTime,
}

/// Outcome of a guarded status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusUpdate {
    Applied,
    NotFound,
    /// The session sits in a state that does not allow the move.
    Rejected(SessionStatus),
}

pub(crate) async fn create(
    pool: &PgPool,
    session: CreateSession<'_>,
) -> Result<ExamSession, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "INSERT INTO exam_sessions (
            id, exam_id, student_id, status, started_at, time_remaining,
            student_seed, device_info, ip_address, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(session.id)
    .bind(session.exam_id)
    .bind(session.student_id)
    .bind(SessionStatus::Active)
    .bind(session.now)
    .bind(session.time_remaining)
    .bind(session.student_seed)
    .bind(session.device_info.map(Json))
    .bind(session.ip_address)
    .bind(session.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Writes `status` only while the session is live, stamping
/// `ended_at` on terminal moves.
pub(crate) async fn update_status(
    conn: &mut PgConnection,
    id: &str,
    status: SessionStatus,
    now: time::PrimitiveDateTime,
) -> Result<StatusUpdate, sqlx::Error> {
    let allowed = SessionStatus::LIVE
        .iter()
        .map(|source| format!("'{}'", source.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    let result = sqlx::query(&format!(
        "UPDATE exam_sessions
         SET status = $1, ended_at = CASE WHEN $2 THEN $3 ELSE ended_at END
         WHERE id = $4 AND status IN ({allowed})"
    ))
    .bind(status)
    .bind(status.is_terminal())
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(StatusUpdate::Applied);
    }

    let current =
        sqlx::query_scalar::<_, SessionStatus>("SELECT status FROM exam_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(match current {
        Some(current) => StatusUpdate::Rejected(current),
        None => StatusUpdate::NotFound,
    })
}

pub(crate) async fn update_time_remaining(
    pool: &PgPool,
    id: &str,
    seconds: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE exam_sessions SET time_remaining = $1 WHERE id = $2")
        .bind(seconds)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Appends to the JSONB log in a single statement so concurrent reports do
/// not overwrite each other.
pub(crate) async fn append_flagged_activity(
    pool: &PgPool,
    id: &str,
    activity: &FlaggedActivity,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE exam_sessions
         SET flagged_activities = flagged_activities || $1::jsonb
         WHERE id = $2",
    )
    .bind(Json(vec![activity]))
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_active_for_instructor(
    pool: &PgPool,
    instructor_id: &str,
) -> Result<Vec<ExamSession>, sqlx::Error> {
    let columns = COLUMNS
        .split(',')
        .map(|column| format!("s.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ");

    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {columns} FROM exam_sessions s
         JOIN exams e ON e.id = s.exam_id
         WHERE s.status = $1 AND e.instructor_id = $2
         ORDER BY s.started_at"
    ))
    .bind(SessionStatus::Active)
    .bind(instructor_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_exam_and_student(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_sessions WHERE exam_id = $1 AND student_id = $2")
        .bind(exam_id)
        .bind(student_id)
        .fetch_one(pool)
        .await
}
