use sqlx::PgPool;

use crate::db::models::Exam;
use crate::db::types::ExamStatus;

const COLUMNS: &str = "\
    id, title, description, instructor_id, duration_minutes, status, \
    max_attempts, shuffle_questions, show_results, created_at, updated_at";

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) instructor_id: &'a str,
    pub(crate) duration_minutes: i32,
    pub(crate) max_attempts: i32,
    pub(crate) shuffle_questions: bool,
    pub(crate) show_results: bool,
    pub(crate) now: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, exam: CreateExam<'_>) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, title, description, instructor_id, duration_minutes, status,
            max_attempts, shuffle_questions, show_results, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(exam.id)
    .bind(exam.title)
    .bind(exam.description)
    .bind(exam.instructor_id)
    .bind(exam.duration_minutes)
    .bind(ExamStatus::Draft)
    .bind(exam.max_attempts)
    .bind(exam.shuffle_questions)
    .bind(exam.show_results)
    .bind(exam.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_instructor(
    pool: &PgPool,
    instructor_id: &str,
) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE instructor_id = $1 ORDER BY created_at DESC"
    ))
    .bind(instructor_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_status(
    pool: &PgPool,
    status: ExamStatus,
) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE status = $1 ORDER BY created_at DESC"
    ))
    .bind(status)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_status(
    pool: &PgPool,
    id: &str,
    status: ExamStatus,
    now: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE exams SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
