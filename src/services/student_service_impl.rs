//! `SeaORM` implementation of the `StudentService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clients::PhotoStore;
use crate::clock::Clock;
use crate::config::SecurityConfig;
use crate::db::repositories::admin::hash_secret;
use crate::db::{NewStudent, Store, StudentPatch};
use crate::models::student::{
    is_valid_pin, normalize_name, normalize_roll, Student, StudentFilters, ValidityWindow,
};
use crate::services::student_service::{
    CreateStudent, PhotoCleanup, StudentError, StudentService, UpdateOutcome, UpdateStudent,
};

pub struct SeaOrmStudentService {
    store: Store,
    photos: Arc<dyn PhotoStore>,
    clock: Arc<dyn Clock>,
    security: SecurityConfig,
}

impl SeaOrmStudentService {
    #[must_use]
    pub fn new(
        store: Store,
        photos: Arc<dyn PhotoStore>,
        clock: Arc<dyn Clock>,
        security: SecurityConfig,
    ) -> Self {
        Self {
            store,
            photos,
            clock,
            security,
        }
    }

    fn validate_window(raw: &str) -> Result<(), StudentError> {
        if ValidityWindow::parse(raw).is_none() {
            return Err(StudentError::Validation(format!(
                "Invalid validity window '{raw}', expected '<start>-<end>' years"
            )));
        }
        Ok(())
    }

    async fn hash_pin(&self, pin: &str) -> Result<String, StudentError> {
        if !is_valid_pin(pin) {
            return Err(StudentError::Validation(
                "PIN must be exactly 4 digits".to_string(),
            ));
        }

        let pin = pin.to_string();
        let security = self.security.clone();
        tokio::task::spawn_blocking(move || hash_secret(&pin, Some(&security)))
            .await
            .map_err(|e| StudentError::Internal(e.to_string()))?
            .map_err(StudentError::from)
    }
}

#[async_trait]
impl StudentService for SeaOrmStudentService {
    async fn create(&self, new: CreateStudent) -> Result<Student, StudentError> {
        let roll = normalize_roll(&new.roll);
        if roll.is_empty() {
            return Err(StudentError::Validation("Roll cannot be empty".to_string()));
        }
        Self::validate_window(&new.issue_valid)?;

        let pin_hash = self.hash_pin(&new.pin).await?;

        // Check the roll before touching the photo store so duplicates never
        // pay for an upload they cannot use.
        if self
            .store
            .student_exists(&roll)
            .await
            .map_err(StudentError::from)?
        {
            return Err(StudentError::DuplicateRoll);
        }

        let photo = self
            .photos
            .upload(new.photo_bytes, &new.photo_filename)
            .await
            .map_err(|e| StudentError::PhotoUpload(e.to_string()))?;

        let inserted = self
            .store
            .insert_student(NewStudent {
                roll: roll.clone(),
                name: normalize_name(&new.name),
                branch: new.branch.trim().to_string(),
                dob: new.dob,
                issue_valid: new.issue_valid.trim().to_string(),
                pin_hash,
                photo_url: photo.url,
                photo_handle: photo.handle.clone(),
                issued_at: self.clock.today(),
            })
            .await
            .map_err(StudentError::from)?;

        if !inserted {
            // Lost a race on the primary key; the asset just uploaded belongs
            // to nobody, so take it back down.
            if let Err(e) = self.photos.delete(&photo.handle).await {
                warn!(roll = %roll, error = %e, "Failed to clean up photo after roll conflict");
            }
            return Err(StudentError::DuplicateRoll);
        }

        self.store
            .get_student(&roll)
            .await
            .map_err(StudentError::from)?
            .ok_or_else(|| StudentError::Internal("Student vanished after insert".to_string()))
    }

    async fn update(
        &self,
        roll: &str,
        update: UpdateStudent,
    ) -> Result<UpdateOutcome, StudentError> {
        let roll = normalize_roll(roll);

        let existing = self
            .store
            .get_student(&roll)
            .await
            .map_err(StudentError::from)?
            .ok_or(StudentError::NotFound)?;

        if let Some(window) = &update.issue_valid {
            Self::validate_window(window)?;
        }

        let pin_hash = match &update.pin {
            Some(pin) => Some(self.hash_pin(pin).await?),
            None => None,
        };

        let mut photo_cleanup = PhotoCleanup::Clean;
        let photo = match update.photo {
            Some((bytes, filename)) => {
                let stored = self
                    .photos
                    .upload(bytes, &filename)
                    .await
                    .map_err(|e| StudentError::PhotoUpload(e.to_string()))?;

                // The record moves to the new asset either way; a failed
                // delete only strands the old one.
                if let Err(e) = self.photos.delete(&existing.photo_handle).await {
                    warn!(roll = %roll, error = %e, "Failed to delete replaced photo");
                    photo_cleanup = PhotoCleanup::OrphanedAsset;
                }

                Some((stored.url, stored.handle))
            }
            None => None,
        };

        let student = self
            .store
            .update_student(
                &roll,
                StudentPatch {
                    name: update.name.map(|n| normalize_name(&n)),
                    branch: update.branch.map(|b| b.trim().to_string()),
                    dob: update.dob,
                    issue_valid: update.issue_valid.map(|w| w.trim().to_string()),
                    pin_hash,
                    photo,
                },
            )
            .await
            .map_err(StudentError::from)?
            .ok_or(StudentError::NotFound)?;

        info!(roll = %roll, "Student updated");

        Ok(UpdateOutcome {
            student,
            photo_cleanup,
        })
    }

    async fn delete(&self, roll: &str) -> Result<PhotoCleanup, StudentError> {
        let roll = normalize_roll(roll);

        let existing = self
            .store
            .get_student(&roll)
            .await
            .map_err(StudentError::from)?
            .ok_or(StudentError::NotFound)?;

        let mut photo_cleanup = PhotoCleanup::Clean;
        if let Err(e) = self.photos.delete(&existing.photo_handle).await {
            warn!(roll = %roll, error = %e, "Failed to delete photo, removing record anyway");
            photo_cleanup = PhotoCleanup::OrphanedAsset;
        }

        let deleted = self
            .store
            .delete_student(&roll)
            .await
            .map_err(StudentError::from)?;
        if !deleted {
            return Err(StudentError::NotFound);
        }

        info!(roll = %roll, "Student deleted");
        Ok(photo_cleanup)
    }

    async fn get(&self, roll: &str) -> Result<Student, StudentError> {
        let roll = normalize_roll(roll);
        self.store
            .get_student(&roll)
            .await
            .map_err(StudentError::from)?
            .ok_or(StudentError::NotFound)
    }

    async fn list(
        &self,
        filters: StudentFilters,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<Student>, StudentError> {
        let mut filters = filters;
        if let Some(roll) = filters.roll.take() {
            filters.roll = Some(normalize_roll(&roll));
        }

        self.store
            .list_students(&filters, self.clock.today(), page, page_size)
            .await
            .map_err(StudentError::from)
    }
}
