use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentExamManager;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, unix_millis_now};
use crate::repositories;
use crate::schemas::question::{
    GenerateQuestionsRequest, QuestionListQuery, StoredQuestionResponse,
};
use crate::services::question_generator::{self, StudentRef};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_questions))
        .route("/generate", post(generate_questions))
}

async fn list_questions(
    CurrentExamManager(_manager): CurrentExamManager,
    State(state): State<AppState>,
    Query(query): Query<QuestionListQuery>,
) -> Result<Json<Vec<StoredQuestionResponse>>, ApiError> {
    let rows = repositories::generated_questions::list_with_names(
        state.db(),
        query.subject.as_deref().filter(|subject| !subject.is_empty()),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(
        rows.into_iter()
            .map(|(question, student_name)| StoredQuestionResponse::from_db(question, student_name))
            .collect(),
    ))
}

/// Draws one unique question per roster student and stores the batch.
async fn generate_questions(
    CurrentExamManager(instructor): CurrentExamManager,
    State(state): State<AppState>,
    Json(payload): Json<GenerateQuestionsRequest>,
) -> Result<Json<Vec<StoredQuestionResponse>>, ApiError> {
    payload.validate().map_err(ApiError::invalid)?;

    let roster = repositories::roster::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch students"))?;
    if roster.is_empty() {
        return Err(ApiError::BadRequest("No students found".to_string()));
    }

    let students = roster
        .into_iter()
        .map(|student| StudentRef { id: student.id, name: student.name })
        .collect::<Vec<_>>();

    let questions = question_generator::generate_for_students(
        &mut rand::thread_rng(),
        &payload.subject,
        &students,
        state.settings().questions().max_attempts,
        unix_millis_now(),
    );

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start batch"))?;
    let mut stored = Vec::with_capacity(questions.len());
    for question in questions {
        let row = repositories::generated_questions::create(
            &mut *tx,
            repositories::generated_questions::CreateStoredQuestion {
                id: &Uuid::new_v4().to_string(),
                unique_id: &question.unique_id,
                student_id: &question.student_id,
                subject: &question.subject,
                question_text: &question.question_text,
                parameters: question.parameters.into_iter().collect(),
                expected_answer: &question.expected_answer,
                difficulty: question.difficulty,
                generated_by: &instructor.id,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store generated question"))?;
        stored.push(StoredQuestionResponse::from_db(row, question.student_name));
    }
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit batch"))?;

    tracing::info!(
        instructor_id = %instructor.id,
        subject = %payload.subject,
        roster = students.len(),
        generated = stored.len(),
        "questions generated"
    );
    Ok(Json(stored))
}
