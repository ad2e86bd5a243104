use sqlx::types::Json;
use sqlx::PgPool;

use crate::db::models::Question;
use crate::db::types::{Difficulty, QuestionType};

const COLUMNS: &str = "\
    id, exam_id, question_type, difficulty, content, options, correct_answer, points, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) question_type: QuestionType,
    pub(crate) difficulty: Difficulty,
    pub(crate) content: &'a str,
    pub(crate) options: Option<&'a [String]>,
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) points: f64,
    pub(crate) now: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    question: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, question_type, difficulty, content, options,
            correct_answer, points, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(question.id)
    .bind(question.exam_id)
    .bind(question.question_type)
    .bind(question.difficulty)
    .bind(question.content)
    .bind(question.options.map(Json))
    .bind(question.correct_answer)
    .bind(question.points)
    .bind(question.now)
    .fetch_one(pool)
    .await
}

/// Questions of an exam in authoring order.
pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY created_at, id"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
