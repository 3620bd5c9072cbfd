//! Scheduled maintenance jobs: absentee sweep, expired-student purge and
//! stale-attendance cleanup. Each job is also reachable through the
//! maintenance API so an operator can trigger it out of band.

use chrono::{Days, NaiveDate};

use crate::db::Store;
use crate::models::attendance::AttendanceStatus;
use crate::models::student::ValidityWindow;
use tracing::{info, warn};

#[derive(Clone)]
pub struct LifecycleService {
    store: Store,
}

impl LifecycleService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Marks every student without a record for `today` as Absent. The
    /// conflict-tolerant insert leaves existing marks (Present included)
    /// untouched, so re-running the sweep is a no-op.
    pub async fn sweep_absentees(&self, today: NaiveDate) -> anyhow::Result<u64> {
        let students = self.store.list_all_validity_windows().await?;

        let mut inserted = 0u64;
        for (roll, _) in students {
            match self
                .store
                .insert_attendance_if_absent(&roll, today, AttendanceStatus::Absent, None)
                .await
            {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(roll = %roll, error = %e, "Absentee sweep failed for student, skipping");
                }
            }
        }

        info!(%today, inserted, "Absentee sweep complete");
        Ok(inserted)
    }

    /// Deletes every student whose validity window ended before `today`.
    /// A credential reading "21-24" stays valid through 2024-12-31 and is
    /// purged on the first run of 2025.
    pub async fn purge_expired_students(&self, today: NaiveDate) -> anyhow::Result<u64> {
        let students = self.store.list_all_validity_windows().await?;

        let mut deleted = 0u64;
        for (roll, raw_window) in students {
            let Some(window) = ValidityWindow::parse(&raw_window) else {
                warn!(roll = %roll, window = %raw_window, "Unparsable validity window, skipping");
                continue;
            };

            if !window.is_expired(today) {
                continue;
            }

            match self.store.delete_student(&roll).await {
                Ok(true) => {
                    info!(roll = %roll, window = %raw_window, "Expired student purged");
                    deleted += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(roll = %roll, error = %e, "Failed to purge expired student, skipping");
                }
            }
        }

        info!(%today, deleted, "Expiry purge complete");
        Ok(deleted)
    }

    /// Deletes attendance strictly older than `retention_days` before
    /// `today`. A row dated exactly the cutoff survives.
    pub async fn purge_old_attendance(
        &self,
        today: NaiveDate,
        retention_days: u64,
    ) -> anyhow::Result<u64> {
        let Some(cutoff) = today.checked_sub_days(Days::new(retention_days)) else {
            anyhow::bail!("Retention of {retention_days} days underflows the calendar");
        };

        let deleted = self.store.delete_attendance_before(cutoff).await?;
        info!(%cutoff, deleted, "Stale attendance purge complete");
        Ok(deleted)
    }
}
