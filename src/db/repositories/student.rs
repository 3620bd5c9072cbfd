use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{attendance_records, prelude::*, students};
use crate::models::student::{Student, StudentFilters};

/// Fields for a brand-new student row. The PIN arrives pre-hashed.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub roll: String,
    pub name: String,
    pub branch: String,
    pub dob: NaiveDate,
    pub issue_valid: String,
    pub pin_hash: String,
    pub photo_url: String,
    pub photo_handle: String,
    pub issued_at: NaiveDate,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub branch: Option<String>,
    pub dob: Option<NaiveDate>,
    pub issue_valid: Option<String>,
    pub pin_hash: Option<String>,
    pub photo: Option<(String, String)>,
}

pub struct StudentRepository {
    conn: DatabaseConnection,
}

impl StudentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: students::Model) -> Student {
        Student {
            roll: model.roll,
            name: model.name,
            branch: model.branch,
            dob: model.dob,
            issue_valid: model.issue_valid,
            photo_url: model.photo_url,
            photo_handle: model.photo_handle,
            issued_at: model.issued_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    /// Inserts a new student. Returns false when the roll is already taken;
    /// the conflict is detected by the primary key, not by a prior read.
    pub async fn insert(&self, new: NewStudent) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();
        let model = students::ActiveModel {
            roll: Set(new.roll.clone()),
            name: Set(new.name),
            branch: Set(new.branch),
            dob: Set(new.dob),
            issue_valid: Set(new.issue_valid),
            pin_hash: Set(new.pin_hash),
            photo_url: Set(new.photo_url),
            photo_handle: Set(new.photo_handle),
            issued_at: Set(new.issued_at),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let result = Students::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(students::Column::Roll)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match result {
            Ok(_) => {
                info!(roll = %new.roll, "Student created");
                Ok(true)
            }
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e).context("Failed to insert student"),
        }
    }

    pub async fn get(&self, roll: &str) -> Result<Option<Student>> {
        let row = Students::find_by_id(roll)
            .one(&self.conn)
            .await
            .context("Failed to query student")?;

        Ok(row.map(Self::map_model))
    }

    pub async fn exists(&self, roll: &str) -> Result<bool> {
        Ok(Students::find_by_id(roll)
            .one(&self.conn)
            .await
            .context("Failed to query student")?
            .is_some())
    }

    /// Applies a partial update, returning the refreshed row. The caller is
    /// responsible for deleting a replaced photo asset.
    pub async fn update(&self, roll: &str, patch: StudentPatch) -> Result<Option<Student>> {
        let Some(row) = Students::find_by_id(roll).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: students::ActiveModel = row.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(branch) = patch.branch {
            active.branch = Set(branch);
        }
        if let Some(dob) = patch.dob {
            active.dob = Set(dob);
        }
        if let Some(issue_valid) = patch.issue_valid {
            active.issue_valid = Set(issue_valid);
        }
        if let Some(pin_hash) = patch.pin_hash {
            active.pin_hash = Set(pin_hash);
        }
        if let Some((url, handle)) = patch.photo {
            active.photo_url = Set(url);
            active.photo_handle = Set(handle);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(Self::map_model(updated)))
    }

    /// Deletes the student's attendance rows, then the student, in one
    /// transaction. Returns false if the roll did not exist.
    pub async fn delete(&self, roll: &str) -> Result<bool> {
        let txn = self.conn.begin().await?;

        AttendanceRecords::delete_many()
            .filter(attendance_records::Column::Roll.eq(roll))
            .exec(&txn)
            .await?;

        let deleted = Students::delete_by_id(roll).exec(&txn).await?;
        txn.commit().await?;

        Ok(deleted.rows_affected > 0)
    }

    pub async fn list(
        &self,
        filters: &StudentFilters,
        today: NaiveDate,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<Student>> {
        let mut query = Students::find();

        if let Some(name) = &filters.name {
            query = query.filter(students::Column::Name.contains(name));
        }
        if let Some(branch) = &filters.branch {
            query = query.filter(students::Column::Branch.eq(branch));
        }
        if let Some(dob) = filters.dob {
            query = query.filter(students::Column::Dob.eq(dob));
        }
        if let Some(roll) = &filters.roll {
            query = query.filter(students::Column::Roll.eq(roll));
        }
        if let Some(years) = filters.issued_within_years {
            let days = u64::try_from(years.max(0)).unwrap_or(0) * 365;
            if let Some(cutoff) = today.checked_sub_days(Days::new(days)) {
                query = query.filter(students::Column::IssuedAt.gte(cutoff));
            }
        }

        // Offset math on caller-supplied values must not overflow, and the
        // bound limit/offset have to fit in SQLite's i64 integers.
        const MAX_SQL_ROWS: u64 = i64::MAX as u64;
        let page_size = page_size.min(MAX_SQL_ROWS);
        let offset = page
            .max(1)
            .saturating_sub(1)
            .saturating_mul(page_size)
            .min(MAX_SQL_ROWS);
        let rows = query
            .order_by_asc(students::Column::Roll)
            .offset(offset)
            .limit(page_size)
            .all(&self.conn)
            .await
            .context("Failed to list students")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Full scan for the lifecycle jobs: every roll with its validity string.
    pub async fn list_all_windows(&self) -> Result<Vec<(String, String)>> {
        let rows = Students::find()
            .order_by_asc(students::Column::Roll)
            .all(&self.conn)
            .await
            .context("Failed to scan students")?;

        Ok(rows.into_iter().map(|s| (s.roll, s.issue_valid)).collect())
    }
}
