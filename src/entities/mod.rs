pub mod prelude;

pub mod admins;
pub mod attendance_records;
pub mod students;
