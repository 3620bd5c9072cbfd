use serde::Serialize;

use crate::models::attendance::AttendanceRecord;
use crate::models::student::Student;
use crate::services::PhotoCleanup;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// A student as returned by the API. The PIN hash never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDto {
    pub roll: String,
    pub name: String,
    pub branch: String,
    pub dob: String,
    pub issue_valid: String,
    pub photo_url: String,
    pub issued_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Student> for StudentDto {
    fn from(s: Student) -> Self {
        Self {
            roll: s.roll,
            name: s.name,
            branch: s.branch,
            dob: s.dob.to_string(),
            issue_valid: s.issue_valid,
            photo_url: s.photo_url,
            issued_at: s.issued_at.to_string(),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDto {
    pub roll: String,
    pub date: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl From<AttendanceRecord> for AttendanceDto {
    fn from(r: AttendanceRecord) -> Self {
        Self {
            roll: r.roll,
            date: r.date.to_string(),
            status: r.status,
            time: r.time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentMutationDto {
    pub student: StudentDto,
    pub photo_cleanup: PhotoCleanup,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkResponse {
    pub roll: String,
    pub date: String,
    pub already_marked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub task: String,
    pub affected: u64,
}
