//! `SeaORM` implementation of the `AttendanceService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::clock::Clock;
use crate::db::Store;
use crate::models::attendance::{
    AttendanceQuery, AttendanceRecord, AttendanceStatus, MarkOutcome,
};
use crate::models::student::normalize_roll;
use crate::services::attendance_service::{AttendanceError, AttendanceService};

pub struct SeaOrmAttendanceService {
    store: Store,
    clock: Arc<dyn Clock>,
}

impl SeaOrmAttendanceService {
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl AttendanceService for SeaOrmAttendanceService {
    async fn mark_present(
        &self,
        roll: &str,
        date: NaiveDate,
        time: Option<String>,
    ) -> Result<MarkOutcome, AttendanceError> {
        let roll = normalize_roll(roll);
        if roll.is_empty() {
            return Err(AttendanceError::Validation(
                "Roll cannot be empty".to_string(),
            ));
        }

        if date != self.clock.today() {
            return Err(AttendanceError::InvalidDate);
        }

        if !self
            .store
            .student_exists(&roll)
            .await
            .map_err(AttendanceError::from)?
        {
            return Err(AttendanceError::StudentNotFound);
        }

        let time = time.or_else(|| Some(self.clock.now_time().format("%H:%M:%S").to_string()));

        let inserted = self
            .store
            .insert_attendance_if_absent(&roll, date, AttendanceStatus::Present, time)
            .await
            .map_err(AttendanceError::from)?;

        if inserted {
            info!(roll = %roll, %date, "Attendance marked");
            Ok(MarkOutcome::Marked)
        } else {
            Ok(MarkOutcome::AlreadyMarked)
        }
    }

    async fn list(
        &self,
        mut query: AttendanceQuery,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        query.roll = normalize_roll(&query.roll);
        if query.roll.is_empty() {
            return Err(AttendanceError::Validation(
                "Roll cannot be empty".to_string(),
            ));
        }

        self.store
            .list_attendance(&query)
            .await
            .map_err(AttendanceError::from)
    }
}
