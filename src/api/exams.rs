use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentExamManager, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Exam, User};
use crate::db::types::{ExamStatus, UserRole};
use crate::repositories;
use crate::schemas::exam::{
    ExamCreate, ExamPaperResponse, ExamResponse, PaperExam, PaperQuestion, QuestionCreate,
    QuestionResponse,
};
use crate::schemas::session::{ExamPaperRequest, SessionResponse};
use crate::services::exam_paper;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_exam).get(list_exams))
        .route("/:exam_id/start", post(start_exam))
        .route("/:exam_id/stop", post(stop_exam))
        .route("/:exam_id/questions", post(create_question).get(list_questions))
        .route("/:exam_id/paper", post(request_paper))
}

async fn create_exam(
    CurrentExamManager(instructor): CurrentExamManager,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(ApiError::invalid)?;

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            instructor_id: &instructor.id,
            duration_minutes: payload.duration_minutes,
            max_attempts: payload.max_attempts,
            shuffle_questions: payload.shuffle_questions,
            show_results: payload.show_results,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(exam_id = %exam.id, instructor_id = %instructor.id, "exam created");
    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

async fn list_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = match user.role {
        UserRole::Instructor => {
            repositories::exams::list_by_instructor(state.db(), &user.id).await
        }
        UserRole::Admin | UserRole::Student => {
            repositories::exams::list_by_status(state.db(), ExamStatus::Active).await
        }
        UserRole::Proctor => return Err(ApiError::Forbidden("Not enough permissions")),
    }
    .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    Ok(Json(exams.into_iter().map(ExamResponse::from_db).collect()))
}

async fn start_exam(
    CurrentExamManager(manager): CurrentExamManager,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamResponse>, ApiError> {
    set_exam_status(&state, &manager, &exam_id, ExamStatus::Active).await
}

async fn stop_exam(
    CurrentExamManager(manager): CurrentExamManager,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamResponse>, ApiError> {
    set_exam_status(&state, &manager, &exam_id, ExamStatus::Completed).await
}

async fn set_exam_status(
    state: &AppState,
    manager: &User,
    exam_id: &str,
    status: ExamStatus,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = load_exam(state, exam_id).await?;
    ensure_exam_owner(manager, &exam)?;

    repositories::exams::update_status(state.db(), exam_id, status, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update exam status"))?;

    tracing::info!(%exam_id, status = ?status, "exam status changed");
    let exam = load_exam(state, exam_id).await?;
    Ok(Json(ExamResponse::from_db(exam)))
}

async fn create_question(
    CurrentExamManager(manager): CurrentExamManager,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(ApiError::invalid)?;
    payload.check_options().map_err(|message| ApiError::BadRequest(message.to_string()))?;

    let exam = load_exam(&state, &exam_id).await?;
    ensure_exam_owner(&manager, &exam)?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            question_type: payload.question_type,
            difficulty: payload.difficulty,
            content: payload.content.trim(),
            options: payload.options.as_deref(),
            correct_answer: payload.correct_answer.as_deref().map(str::trim),
            points: payload.points,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    tracing::info!(exam_id = %exam.id, question_id = %question.id, "question added");
    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

/// Full questions with their keys; students only see them on a paper.
async fn list_questions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    if user.role == UserRole::Student {
        return Err(ApiError::Forbidden("Not enough permissions"));
    }

    let exam = load_exam(&state, &exam_id).await?;
    if user.role == UserRole::Instructor {
        ensure_exam_owner(&user, &exam)?;
    }

    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

/// Opens a timed session for the calling student and hands out the paper,
/// shuffled by the session seed when the exam asks for it.
async fn request_paper(
    CurrentUser(student): CurrentUser,
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<ExamPaperRequest>>,
) -> Result<(StatusCode, Json<ExamPaperResponse>), ApiError> {
    if student.role != UserRole::Student {
        return Err(ApiError::Forbidden("Only students can take exams"));
    }

    let exam = load_exam(&state, &exam_id).await?;
    if exam.status != ExamStatus::Active {
        return Err(ApiError::BadRequest("Exam is not active".to_string()));
    }

    let attempts =
        repositories::sessions::count_by_exam_and_student(state.db(), &exam.id, &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    if attempts >= i64::from(exam.max_attempts) {
        return Err(ApiError::Conflict("Maximum attempts reached".to_string()));
    }

    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let seed = rand::random::<u32>();
    let session = repositories::sessions::create(
        state.db(),
        repositories::sessions::CreateSession {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            student_id: &student.id,
            time_remaining: exam.duration_minutes.saturating_mul(60),
            student_seed: &seed.to_string(),
            device_info: payload.device_info,
            ip_address: client_ip(&headers),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam session"))?;

    let mut paper = questions.into_iter().map(PaperQuestion::from_db).collect::<Vec<_>>();
    exam_paper::arrange(&mut paper, exam.shuffle_questions, u64::from(seed));

    tracing::info!(
        session_id = %session.id,
        exam_id = %exam.id,
        student_id = %student.id,
        questions = paper.len(),
        "exam session started"
    );
    Ok((
        StatusCode::CREATED,
        Json(ExamPaperResponse {
            session: SessionResponse::from_db(session),
            questions: paper,
            exam: PaperExam {
                id: exam.id,
                title: exam.title,
                duration_minutes: exam.duration_minutes,
            },
        }),
    ))
}

pub(crate) async fn load_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

fn ensure_exam_owner(user: &User, exam: &Exam) -> Result<(), ApiError> {
    if user.role == UserRole::Admin || exam.instructor_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not enough permissions for this exam"))
    }
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|value| value.to_str().ok()))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
