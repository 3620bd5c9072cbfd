use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use std::sync::Arc;

use super::{ApiError, ApiResponse, TaskSummary};
use crate::state::SharedState;

/// Shared-secret gate for the maintenance endpoints. An empty configured key
/// disables the surface entirely rather than leaving it open.
async fn check_maintenance_key(
    state: &SharedState,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    let expected = state.config.read().await.server.maintenance_key.clone();
    if expected.is_empty() {
        return Err(ApiError::Unauthorized(
            "Maintenance endpoints are disabled".to_string(),
        ));
    }

    let presented = headers
        .get("X-Maintenance-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented != expected {
        return Err(ApiError::Unauthorized("Invalid maintenance key".to_string()));
    }

    Ok(())
}

/// POST /tasks/mark-absent
pub async fn mark_absent(
    State(state): State<Arc<SharedState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    check_maintenance_key(&state, &headers).await?;

    let inserted = state.lifecycle.sweep_absentees(state.clock.today()).await?;
    Ok(Json(ApiResponse::success(TaskSummary {
        task: "mark-absent".to_string(),
        affected: inserted,
    })))
}

/// POST /tasks/delete-expired-students
pub async fn delete_expired_students(
    State(state): State<Arc<SharedState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    check_maintenance_key(&state, &headers).await?;

    let deleted = state
        .lifecycle
        .purge_expired_students(state.clock.today())
        .await?;
    Ok(Json(ApiResponse::success(TaskSummary {
        task: "delete-expired-students".to_string(),
        affected: deleted,
    })))
}

/// POST /tasks/cleanup-old-attendance
pub async fn cleanup_old_attendance(
    State(state): State<Arc<SharedState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    check_maintenance_key(&state, &headers).await?;

    let retention_days = state.config.read().await.retention.attendance_days;
    let deleted = state
        .lifecycle
        .purge_old_attendance(state.clock.today(), retention_days)
        .await?;
    Ok(Json(ApiResponse::success(TaskSummary {
        task: "cleanup-old-attendance".to_string(),
        affected: deleted,
    })))
}
