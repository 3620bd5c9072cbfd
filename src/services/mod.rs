pub mod attendance_service;
pub mod attendance_service_impl;
pub mod auth_service;
pub mod auth_service_impl;
pub mod lifecycle;
pub mod student_service;
pub mod student_service_impl;

pub use attendance_service::{AttendanceError, AttendanceService};
pub use attendance_service_impl::SeaOrmAttendanceService;
pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;
pub use lifecycle::LifecycleService;
pub use student_service::{
    CreateStudent, PhotoCleanup, StudentError, StudentService, UpdateOutcome, UpdateStudent,
};
pub use student_service_impl::SeaOrmStudentService;
