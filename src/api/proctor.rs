use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStaff;
use crate::core::state::AppState;
use crate::realtime::protocol::ProctorAction;
use crate::repositories::{self, sessions::StatusUpdate};
use crate::schemas::session::{ProctorActionResponse, SessionResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_active_sessions))
        .route("/sessions/:session_id/pause", post(pause_session))
        .route("/sessions/:session_id/resume", post(resume_session))
        .route("/sessions/:session_id/terminate", post(terminate_session))
}

#[derive(Debug, Serialize)]
struct MonitoredSession {
    #[serde(flatten)]
    session: SessionResponse,
    student_connected: bool,
}

async fn list_active_sessions(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<MonitoredSession>>, ApiError> {
    let sessions = repositories::sessions::list_active_for_instructor(state.db(), &staff.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list active sessions"))?;

    let registry = state.channel().registry();
    let mut monitored = Vec::with_capacity(sessions.len());
    for session in sessions {
        let student_connected = registry
            .find_by_session(&session.id)
            .await
            .iter()
            .any(|connection| connection.user_id == session.student_id);
        monitored.push(MonitoredSession {
            session: SessionResponse::from_db(session),
            student_connected,
        });
    }

    Ok(Json(monitored))
}

async fn pause_session(
    staff: CurrentStaff,
    state: State<AppState>,
    session_id: Path<String>,
) -> Result<Json<ProctorActionResponse>, ApiError> {
    apply(staff, state, session_id, ProctorAction::PauseSession).await
}

async fn resume_session(
    staff: CurrentStaff,
    state: State<AppState>,
    session_id: Path<String>,
) -> Result<Json<ProctorActionResponse>, ApiError> {
    apply(staff, state, session_id, ProctorAction::ResumeSession).await
}

async fn terminate_session(
    staff: CurrentStaff,
    state: State<AppState>,
    session_id: Path<String>,
) -> Result<Json<ProctorActionResponse>, ApiError> {
    apply(staff, state, session_id, ProctorAction::TerminateSession).await
}

/// Same transition and student notification as a socket `proctor_action`.
async fn apply(
    CurrentStaff(staff): CurrentStaff,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    action: ProctorAction,
) -> Result<Json<ProctorActionResponse>, ApiError> {
    let outcome = state
        .channel()
        .apply_proctor_action(action, &session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update session status"))?;

    match outcome.update {
        StatusUpdate::Applied => {
            tracing::info!(
                %session_id,
                user_id = %staff.id,
                action = action.as_str(),
                "proctor action via REST"
            );
            Ok(Json(ProctorActionResponse {
                session_id,
                status: action.target_status(),
                notified: outcome.delivered,
            }))
        }
        StatusUpdate::NotFound => Err(ApiError::NotFound("Session not found".to_string())),
        StatusUpdate::Rejected(current) => {
            Err(ApiError::Conflict(format!("Session is already {}", current.as_str())))
        }
    }
}
