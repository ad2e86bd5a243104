use sqlx::{PgExecutor, PgPool};

use crate::db::models::ExamAnswer;

const COLUMNS: &str =
    "id, session_id, question_id, answer, is_correct, points_awarded, time_spent, answered_at";

pub(crate) struct CreateAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) answer: Option<&'a str>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) points_awarded: Option<f64>,
    pub(crate) time_spent: Option<i32>,
    pub(crate) answered_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl PgExecutor<'_>,
    answer: CreateAnswer<'_>,
) -> Result<ExamAnswer, sqlx::Error> {
    sqlx::query_as::<_, ExamAnswer>(&format!(
        "INSERT INTO exam_answers (
            id, session_id, question_id, answer, is_correct, points_awarded, time_spent, answered_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(answer.id)
    .bind(answer.session_id)
    .bind(answer.question_id)
    .bind(answer.answer)
    .bind(answer.is_correct)
    .bind(answer.points_awarded)
    .bind(answer.time_spent)
    .bind(answer.answered_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_session(
    pool: &PgPool,
    session_id: &str,
) -> Result<Vec<ExamAnswer>, sqlx::Error> {
    sqlx::query_as::<_, ExamAnswer>(&format!(
        "SELECT {COLUMNS} FROM exam_answers WHERE session_id = $1 ORDER BY answered_at"
    ))
    .bind(session_id)
    .fetch_all(pool)
    .await
}
