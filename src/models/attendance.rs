use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceRecord {
    pub roll: String,
    pub date: NaiveDate,
    pub status: String,
    pub time: Option<String>,
}

/// Outcome of a mark-present call. Marking is idempotent per (roll, day):
/// a second call the same day reports `AlreadyMarked` and writes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    AlreadyMarked,
}

/// Sort order for attendance listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceOrder {
    Roll,
    Date,
}

/// Query for the attendance listing. `roll` is mandatory at the API layer;
/// the repository receives it already normalized.
#[derive(Debug, Clone)]
pub struct AttendanceQuery {
    pub roll: String,
    /// Case-insensitive substring match on the status.
    pub status: Option<String>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub order_by: Option<AttendanceOrder>,
}

/// Default listing window: from the 1st of this month one year ago, to today.
#[must_use]
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    use chrono::Datelike;
    let start = NaiveDate::from_ymd_opt(today.year() - 1, today.month(), 1)
        .unwrap_or(today);
    (start, today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_starts_on_the_first() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (from, to) = default_range(today);
        assert_eq!(from, NaiveDate::from_ymd_opt(2023, 3, 1).unwrap());
        assert_eq!(to, today);
    }
}
