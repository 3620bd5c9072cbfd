use anyhow::{Context, Result};
use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{attendance_records, prelude::*};
use crate::models::attendance::{
    AttendanceOrder, AttendanceQuery, AttendanceRecord, AttendanceStatus,
};

pub struct AttendanceRepository {
    conn: DatabaseConnection,
}

impl AttendanceRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: attendance_records::Model) -> AttendanceRecord {
        AttendanceRecord {
            roll: model.roll,
            date: model.date,
            status: model.status,
            time: model.time,
        }
    }

    /// Inserts a record unless one already exists for (roll, date). The
    /// composite primary key decides; two racing callers cannot both insert.
    /// Returns false when the row was already there. Never updates a status.
    pub async fn insert_if_absent(
        &self,
        roll: &str,
        date: NaiveDate,
        status: AttendanceStatus,
        time: Option<String>,
    ) -> Result<bool> {
        let model = attendance_records::ActiveModel {
            roll: Set(roll.to_string()),
            date: Set(date),
            status: Set(status.as_str().to_string()),
            time: Set(time),
        };

        let result = AttendanceRecords::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    attendance_records::Column::Roll,
                    attendance_records::Column::Date,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec(&self.conn)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e).context("Failed to insert attendance record"),
        }
    }

    pub async fn list(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>> {
        let mut find = AttendanceRecords::find()
            .filter(attendance_records::Column::Roll.eq(query.roll.as_str()))
            .filter(attendance_records::Column::Date.gte(query.from))
            .filter(attendance_records::Column::Date.lte(query.to));

        if let Some(status) = &query.status {
            find = find.filter(attendance_records::Column::Status.contains(status));
        }

        find = match query.order_by {
            Some(AttendanceOrder::Roll) => find.order_by_asc(attendance_records::Column::Roll),
            Some(AttendanceOrder::Date) | None => {
                find.order_by_asc(attendance_records::Column::Date)
            }
        };

        let rows = find
            .all(&self.conn)
            .await
            .context("Failed to list attendance")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    /// Retention purge: removes everything strictly older than the cutoff.
    pub async fn delete_before(&self, cutoff: NaiveDate) -> Result<u64> {
        let result = AttendanceRecords::delete_many()
            .filter(attendance_records::Column::Date.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to purge old attendance")?;

        Ok(result.rows_affected)
    }
}
