use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::collections::HashMap;

use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exams::load_exam;
use crate::api::guards::{ensure_owner_or_staff, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::ExamSession;
use crate::db::types::{SessionStatus, UserRole};
use crate::repositories::{self, sessions::StatusUpdate};
use crate::schemas::session::{
    AnswerResponse, SessionResponse, SessionResultsResponse, SubmitRequest,
};
use crate::services::exam_paper;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:session_id", get(get_session))
        .route("/:session_id/submit", post(submit_session))
        .route("/:session_id/results", get(session_results))
}

async fn get_session(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = load_session(&state, &session_id).await?;
    ensure_owner_or_staff(&user, &session.student_id)?;
    Ok(Json(SessionResponse::from_db(session)))
}

/// Scores and stores the answers and completes the session in one
/// transaction. Every answer must refer to a question of the session's exam.
async fn submit_session(
    CurrentUser(student): CurrentUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Option<Json<SubmitRequest>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    payload.validate().map_err(ApiError::invalid)?;

    let session = load_session(&state, &session_id).await?;
    if session.student_id != student.id {
        return Err(ApiError::Forbidden("Not enough permissions for this session"));
    }
    if session.time_remaining.is_some_and(|seconds| seconds <= 0) {
        return Err(ApiError::BadRequest("Time limit exceeded".to_string()));
    }

    let questions = repositories::questions::list_by_exam(state.db(), &session.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let questions = questions
        .into_iter()
        .map(|question| (question.id.clone(), question))
        .collect::<HashMap<_, _>>();
    if let Some(unknown) =
        payload.answers.iter().find(|answer| !questions.contains_key(&answer.question_id))
    {
        return Err(ApiError::BadRequest(format!("Unknown question: {}", unknown.question_id)));
    }

    let now = primitive_now_utc();
    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start submission"))?;

    for answer in &payload.answers {
        let score = questions
            .get(&answer.question_id)
            .map(|question| exam_paper::score(question, answer.answer.as_deref()))
            .unwrap_or(exam_paper::Score::UNGRADED);
        repositories::answers::create(
            &mut *tx,
            repositories::answers::CreateAnswer {
                id: &Uuid::new_v4().to_string(),
                session_id: &session.id,
                question_id: &answer.question_id,
                answer: answer.answer.as_deref(),
                is_correct: score.is_correct,
                points_awarded: score.points_awarded,
                time_spent: answer.time_spent,
                answered_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store answers"))?;
    }

    match repositories::sessions::update_status(&mut tx, &session.id, SessionStatus::Completed, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to complete session"))?
    {
        StatusUpdate::Applied => {}
        StatusUpdate::NotFound => return Err(ApiError::NotFound("Session not found".to_string())),
        StatusUpdate::Rejected(current) => {
            return Err(ApiError::Conflict(format!("Session is already {}", current.as_str())));
        }
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit submission"))?;

    tracing::info!(
        session_id = %session.id,
        student_id = %student.id,
        answers = payload.answers.len(),
        "exam session submitted"
    );
    let session = load_session(&state, &session_id).await?;
    Ok(Json(SessionResponse::from_db(session)))
}

async fn session_results(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResultsResponse>, ApiError> {
    let session = load_session(&state, &session_id).await?;
    ensure_owner_or_staff(&user, &session.student_id)?;
    if user.role == UserRole::Student {
        let exam = load_exam(&state, &session.exam_id).await?;
        if !exam.show_results {
            return Err(ApiError::Forbidden("Results are not available for this exam"));
        }
    }

    let answers = repositories::answers::list_by_session(state.db(), &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    Ok(Json(SessionResultsResponse {
        session: SessionResponse::from_db(session),
        answers: answers.into_iter().map(AnswerResponse::from_db).collect(),
    }))
}

pub(crate) async fn load_session(
    state: &AppState,
    session_id: &str,
) -> Result<ExamSession, ApiError> {
    repositories::sessions::find_by_id(state.db(), session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load session"))?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}
