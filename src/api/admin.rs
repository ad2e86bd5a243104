use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::realtime::channel::STAFF_ROLES;
use crate::repositories;
use crate::schemas::admin::{completion_rate, SystemStatsResponse};
use crate::schemas::user::{UserListQuery, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/stats", get(system_stats)).route("/users", get(list_users))
}

async fn system_stats(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let counts = repositories::stats::system_counts(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load system stats"))?;

    let registry = state.channel().registry();
    let connected_students = registry.find_by_roles(&[UserRole::Student]).await.len();
    let connected_staff = registry.find_by_roles(&STAFF_ROLES).await.len();

    Ok(Json(SystemStatsResponse {
        total_users: counts.total_users,
        active_exams: counts.active_exams,
        completion_rate: completion_rate(counts.completed_sessions, counts.total_sessions),
        flagged_sessions: counts.flagged_sessions,
        connected_students,
        connected_staff,
    }))
}

async fn list_users(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let Some(role) = query.role else {
        return Ok(Json(Vec::new()));
    };

    let users = repositories::users::list_by_role(state.db(), role)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    Ok(Json(users.into_iter().map(UserResponse::from_db).collect()))
}
