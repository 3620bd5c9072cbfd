//! Domain service for student records.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::student::{Student, StudentFilters};

#[derive(Debug, Error)]
pub enum StudentError {
    #[error("Student not found")]
    NotFound,

    #[error("Roll number already exists")]
    DuplicateRoll,

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Upload failure at create/update time. The record cannot exist without
    /// a photo reference, so this propagates to the caller.
    #[error("Photo upload failed: {0}")]
    PhotoUpload(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for StudentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for StudentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Whether a mutation left an orphaned asset at the photo store. Delete
/// failures never block the record mutation; they surface here so the
/// response can flag them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoCleanup {
    Clean,
    OrphanedAsset,
}

/// A new student, photo bytes included (upload happens inside the service).
#[derive(Debug)]
pub struct CreateStudent {
    pub roll: String,
    pub name: String,
    pub branch: String,
    pub dob: NaiveDate,
    pub issue_valid: String,
    pub pin: String,
    pub photo_bytes: Vec<u8>,
    pub photo_filename: String,
}

/// Partial update; blank fields are filtered out at the API layer.
#[derive(Debug, Default)]
pub struct UpdateStudent {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub dob: Option<NaiveDate>,
    pub issue_valid: Option<String>,
    pub pin: Option<String>,
    pub photo: Option<(Vec<u8>, String)>,
}

#[derive(Debug)]
pub struct UpdateOutcome {
    pub student: Student,
    pub photo_cleanup: PhotoCleanup,
}

#[async_trait::async_trait]
pub trait StudentService: Send + Sync {
    /// Creates a student. The roll is checked before the photo upload, and a
    /// conflicting insert afterwards cleans the uploaded asset back up, so a
    /// `DuplicateRoll` failure never leaves an orphan photo.
    async fn create(&self, new: CreateStudent) -> Result<Student, StudentError>;

    async fn update(&self, roll: &str, update: UpdateStudent)
        -> Result<UpdateOutcome, StudentError>;

    /// Deletes the student's photo (best-effort), attendance, then the record.
    async fn delete(&self, roll: &str) -> Result<PhotoCleanup, StudentError>;

    async fn get(&self, roll: &str) -> Result<Student, StudentError>;

    async fn list(
        &self,
        filters: StudentFilters,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<Student>, StudentError>;
}
