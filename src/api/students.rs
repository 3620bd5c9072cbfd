use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, StudentDto, StudentMutationDto};
use crate::models::student::StudentFilters;
use crate::services::{CreateStudent, UpdateStudent};
use crate::state::SharedState;

const DEFAULT_PAGE_SIZE: u64 = 100;

#[derive(Debug, Default)]
struct StudentForm {
    roll: Option<String>,
    name: Option<String>,
    branch: Option<String>,
    dob: Option<NaiveDate>,
    issue_valid: Option<String>,
    pin: Option<String>,
    photo: Option<(Vec<u8>, String)>,
}

/// Reads the multipart form shared by create and update. Blank text fields
/// are treated as not supplied, so a UI can post its whole form unchanged.
async fn read_student_form(mut multipart: Multipart) -> Result<StudentForm, ApiError> {
    let mut form = StudentForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::ValidationError(format!("Malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };

        if name == "photo" {
            let filename = field
                .file_name()
                .map_or_else(|| "photo".to_string(), ToString::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::ValidationError(format!("Failed to read photo: {e}")))?;
            if !bytes.is_empty() {
                form.photo = Some((bytes.to_vec(), filename));
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::ValidationError(format!("Failed to read field {name}: {e}")))?;
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }

        match name.as_str() {
            "roll" => form.roll = Some(value),
            "name" => form.name = Some(value),
            "branch" => form.branch = Some(value),
            "dob" => {
                let dob = value.parse::<NaiveDate>().map_err(|_| {
                    ApiError::ValidationError(format!("Invalid dob '{value}', expected YYYY-MM-DD"))
                })?;
                form.dob = Some(dob);
            }
            "issue_valid" => form.issue_valid = Some(value),
            "pin" => form.pin = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

fn require(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field.ok_or_else(|| ApiError::ValidationError(format!("Missing field: {name}")))
}

/// POST /students (multipart)
pub async fn create_student(
    State(state): State<Arc<SharedState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_student_form(multipart).await?;

    let (photo_bytes, photo_filename) = form
        .photo
        .ok_or_else(|| ApiError::ValidationError("Missing field: photo".to_string()))?;
    let dob = form
        .dob
        .ok_or_else(|| ApiError::ValidationError("Missing field: dob".to_string()))?;

    let student = state
        .student_service
        .create(CreateStudent {
            roll: require(form.roll, "roll")?,
            name: require(form.name, "name")?,
            branch: require(form.branch, "branch")?,
            dob,
            issue_valid: require(form.issue_valid, "issue_valid")?,
            pin: require(form.pin, "pin")?,
            photo_bytes,
            photo_filename,
        })
        .await?;

    Ok(Json(ApiResponse::success(StudentDto::from(student))))
}

/// PUT /students/{roll} (multipart, all fields optional)
pub async fn update_student(
    State(state): State<Arc<SharedState>>,
    Path(roll): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_student_form(multipart).await?;

    let outcome = state
        .student_service
        .update(
            &roll,
            UpdateStudent {
                name: form.name,
                branch: form.branch,
                dob: form.dob,
                issue_valid: form.issue_valid,
                pin: form.pin,
                photo: form.photo,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(StudentMutationDto {
        student: StudentDto::from(outcome.student),
        photo_cleanup: outcome.photo_cleanup,
    })))
}

/// DELETE /students/{roll}
pub async fn delete_student(
    State(state): State<Arc<SharedState>>,
    Path(roll): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.student_service.delete(&roll).await?;
    Ok(Json(ApiResponse::success(format!("Student {roll} deleted"))))
}

/// GET /students/{roll}
pub async fn get_student(
    State(state): State<Arc<SharedState>>,
    Path(roll): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.student_service.get(&roll).await?;
    Ok(Json(ApiResponse::success(StudentDto::from(student))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStudentsQuery {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub dob: Option<NaiveDate>,
    pub roll: Option<String>,
    pub last_years: Option<i64>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// GET /students
pub async fn list_students(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<ListStudentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filters = StudentFilters {
        name: query.name,
        branch: query.branch,
        dob: query.dob,
        roll: query.roll,
        issued_within_years: query.last_years,
    };

    let students = state
        .student_service
        .list(
            filters,
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;

    let dtos: Vec<StudentDto> = students.into_iter().map(StudentDto::from).collect();
    Ok(Json(ApiResponse::success(dtos)))
}
