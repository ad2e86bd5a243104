use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentExamManager;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::question::{RosterStudentCreate, RosterStudentResponse, RosterStudentUpdate};

/// Question lab roster. Entries are plain records, not login accounts.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:student_id", patch(update_student).delete(delete_student))
}

async fn list_students(
    CurrentExamManager(_manager): CurrentExamManager,
    State(state): State<AppState>,
) -> Result<Json<Vec<RosterStudentResponse>>, ApiError> {
    let students = repositories::roster::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch students"))?;
    Ok(Json(students.into_iter().map(RosterStudentResponse::from_db).collect()))
}

async fn create_student(
    CurrentExamManager(_manager): CurrentExamManager,
    State(state): State<AppState>,
    Json(payload): Json<RosterStudentCreate>,
) -> Result<(StatusCode, Json<RosterStudentResponse>), ApiError> {
    payload.validate().map_err(ApiError::invalid)?;
    let email = payload.email.trim();
    ensure_email_free(&state, email, None).await?;

    let student = repositories::roster::create(
        state.db(),
        repositories::roster::CreateRosterStudent {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            email,
            status: &payload.status,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create student"))?;

    Ok((StatusCode::CREATED, Json(RosterStudentResponse::from_db(student))))
}

async fn update_student(
    CurrentExamManager(_manager): CurrentExamManager,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(payload): Json<RosterStudentUpdate>,
) -> Result<Json<RosterStudentResponse>, ApiError> {
    payload.validate().map_err(ApiError::invalid)?;
    let email = payload.email.as_deref().map(str::trim);
    if let Some(email) = email {
        ensure_email_free(&state, email, Some(&student_id)).await?;
    }

    let student = repositories::roster::update(
        state.db(),
        &student_id,
        repositories::roster::UpdateRosterStudent {
            name: payload.name.as_deref().map(str::trim),
            email,
            status: payload.status.as_deref(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update student"))?
    .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(RosterStudentResponse::from_db(student)))
}

/// Also drops the student's generated questions.
async fn delete_student(
    CurrentExamManager(_manager): CurrentExamManager,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::roster::delete(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete student"))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Student not found".to_string()))
    }
}

async fn ensure_email_free(
    state: &AppState,
    email: &str,
    except_id: Option<&str>,
) -> Result<(), ApiError> {
    let taken = repositories::roster::email_taken(state.db(), email, except_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check student email"))?;
    if taken {
        return Err(ApiError::Conflict("Student with this email already exists".to_string()));
    }
    Ok(())
}
