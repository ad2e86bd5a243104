use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::db::models::StoredQuestion;
use crate::db::types::Difficulty;

const COLUMNS: &str = "\
    id, unique_id, student_id, subject, question_text, parameters, \
    expected_answer, difficulty, generated_by, created_at";

pub(crate) struct CreateStoredQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) unique_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) subject: &'a str,
    pub(crate) question_text: &'a str,
    pub(crate) parameters: serde_json::Map<String, serde_json::Value>,
    pub(crate) expected_answer: &'a str,
    pub(crate) difficulty: Difficulty,
    pub(crate) generated_by: &'a str,
    pub(crate) now: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    question: CreateStoredQuestion<'_>,
) -> Result<StoredQuestion, sqlx::Error> {
    sqlx::query_as::<_, StoredQuestion>(&format!(
        "INSERT INTO generated_questions (
            id, unique_id, student_id, subject, question_text, parameters,
            expected_answer, difficulty, generated_by, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(question.id)
    .bind(question.unique_id)
    .bind(question.student_id)
    .bind(question.subject)
    .bind(question.question_text)
    .bind(Json(question.parameters))
    .bind(question.expected_answer)
    .bind(question.difficulty)
    .bind(question.generated_by)
    .bind(question.now)
    .fetch_one(executor)
    .await
}

/// Newest first, with the roster name of each question's student.
pub(crate) async fn list_with_names(
    pool: &PgPool,
    subject: Option<&str>,
) -> Result<Vec<(StoredQuestion, String)>, sqlx::Error> {
    let columns = COLUMNS
        .split(',')
        .map(|column| format!("q.{}", column.trim()))
        .collect::<Vec<_>>()
        .join(", ");

    let rows = sqlx::query_as::<_, NamedRow>(&format!(
        "SELECT {columns}, s.name AS student_name
         FROM generated_questions q
         JOIN roster_students s ON s.id = q.student_id
         WHERE $1::VARCHAR IS NULL OR q.subject = $1
         ORDER BY q.created_at DESC, q.unique_id"
    ))
    .bind(subject)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| (row.question, row.student_name)).collect())
}

#[derive(sqlx::FromRow)]
struct NamedRow {
    #[sqlx(flatten)]
    question: StoredQuestion,
    student_name: String,
}
