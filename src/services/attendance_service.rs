//! Domain service for attendance marking and queries.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::attendance::{AttendanceQuery, AttendanceRecord, MarkOutcome};

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Student not found")]
    StudentNotFound,

    /// Marking is only accepted for the current server date.
    #[error("Date must be today")]
    InvalidDate,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AttendanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AttendanceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait AttendanceService: Send + Sync {
    /// Records a Present mark for the roll on the given date. The insert
    /// itself decides between [`MarkOutcome::Marked`] and
    /// [`MarkOutcome::AlreadyMarked`]; there is no read-then-write window.
    async fn mark_present(
        &self,
        roll: &str,
        date: NaiveDate,
        time: Option<String>,
    ) -> Result<MarkOutcome, AttendanceError>;

    /// Lists records for one roll, newest-first constraints supplied by the
    /// query. The roll is mandatory; the date range defaults upstream.
    async fn list(&self, query: AttendanceQuery) -> Result<Vec<AttendanceRecord>, AttendanceError>;
}
