pub use super::admins::Entity as Admins;
pub use super::attendance_records::Entity as AttendanceRecords;
pub use super::students::Entity as Students;
