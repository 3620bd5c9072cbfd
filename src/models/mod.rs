pub mod attendance;
pub mod student;

pub use attendance::{
    AttendanceOrder, AttendanceQuery, AttendanceRecord, AttendanceStatus, MarkOutcome,
};
pub use student::{Student, StudentFilters, ValidityWindow};
