use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AttendanceDto, MarkResponse};
use crate::models::attendance::{AttendanceOrder, AttendanceQuery, MarkOutcome, default_range};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    pub roll: String,
    pub date: NaiveDate,
    pub time: Option<String>,
}

/// POST /attendance/mark
///
/// Scanners post this endpoint on every card read; a repeat scan the same
/// day is reported back as `alreadyMarked` rather than an error.
pub async fn mark_attendance(
    State(state): State<Arc<SharedState>>,
    Json(req): Json<MarkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .attendance_service
        .mark_present(&req.roll, req.date, req.time)
        .await?;

    Ok(Json(ApiResponse::success(MarkResponse {
        roll: req.roll.trim().to_uppercase(),
        date: req.date.to_string(),
        already_marked: outcome == MarkOutcome::AlreadyMarked,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ListAttendanceQuery {
    pub roll: Option<String>,
    pub status: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    #[serde(rename = "orderBy")]
    pub order_by: Option<String>,
}

/// GET /attendance
pub async fn list_attendance(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<ListAttendanceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let roll = query
        .roll
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| {
            ApiError::ValidationError("Query parameter 'roll' is required".to_string())
        })?;

    let order_by = match query.order_by.as_deref() {
        None => None,
        Some("roll") => Some(AttendanceOrder::Roll),
        Some("date") => Some(AttendanceOrder::Date),
        Some(other) => {
            return Err(ApiError::ValidationError(format!(
                "Invalid orderBy '{other}', expected 'roll' or 'date'"
            )));
        }
    };

    let (default_from, default_to) = default_range(state.clock.today());
    let records = state
        .attendance_service
        .list(AttendanceQuery {
            roll,
            status: query.status,
            from: query.from_date.unwrap_or(default_from),
            to: query.to_date.unwrap_or(default_to),
            order_by,
        })
        .await?;

    let dtos: Vec<AttendanceDto> = records.into_iter().map(AttendanceDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}
