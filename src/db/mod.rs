use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::admin::Admin;
pub use repositories::student::{NewStudent, StudentPatch};

use crate::config::SecurityConfig;
use crate::models::attendance::{AttendanceQuery, AttendanceRecord, AttendanceStatus};
use crate::models::student::{Student, StudentFilters};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // An in-memory sqlite database exists per connection; more than one
        // connection would see an empty schema.
        let in_memory = db_url.contains(":memory:");
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn student_repo(&self) -> repositories::student::StudentRepository {
        repositories::student::StudentRepository::new(self.conn.clone())
    }

    fn attendance_repo(&self) -> repositories::attendance::AttendanceRepository {
        repositories::attendance::AttendanceRepository::new(self.conn.clone())
    }

    fn admin_repo(&self) -> repositories::admin::AdminRepository {
        repositories::admin::AdminRepository::new(self.conn.clone())
    }

    // ---- students ----

    pub async fn insert_student(&self, new: NewStudent) -> Result<bool> {
        self.student_repo().insert(new).await
    }

    pub async fn get_student(&self, roll: &str) -> Result<Option<Student>> {
        self.student_repo().get(roll).await
    }

    pub async fn student_exists(&self, roll: &str) -> Result<bool> {
        self.student_repo().exists(roll).await
    }

    pub async fn update_student(
        &self,
        roll: &str,
        patch: StudentPatch,
    ) -> Result<Option<Student>> {
        self.student_repo().update(roll, patch).await
    }

    pub async fn delete_student(&self, roll: &str) -> Result<bool> {
        self.student_repo().delete(roll).await
    }

    pub async fn list_students(
        &self,
        filters: &StudentFilters,
        today: NaiveDate,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<Student>> {
        self.student_repo().list(filters, today, page, page_size).await
    }

    pub async fn list_all_validity_windows(&self) -> Result<Vec<(String, String)>> {
        self.student_repo().list_all_windows().await
    }

    // ---- attendance ----

    pub async fn insert_attendance_if_absent(
        &self,
        roll: &str,
        date: NaiveDate,
        status: AttendanceStatus,
        time: Option<String>,
    ) -> Result<bool> {
        self.attendance_repo()
            .insert_if_absent(roll, date, status, time)
            .await
    }

    pub async fn list_attendance(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>> {
        self.attendance_repo().list(query).await
    }

    pub async fn delete_attendance_before(&self, cutoff: NaiveDate) -> Result<u64> {
        self.attendance_repo().delete_before(cutoff).await
    }

    // ---- admins ----

    pub async fn get_admin(&self, user_id: &str) -> Result<Option<Admin>> {
        self.admin_repo().get(user_id).await
    }

    pub async fn verify_admin_password(&self, user_id: &str, password: &str) -> Result<bool> {
        self.admin_repo().verify_password(user_id, password).await
    }

    pub async fn update_admin_password(
        &self,
        user_id: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        self.admin_repo()
            .update_password(user_id, new_password, config)
            .await
    }

    pub async fn set_admin_token(&self, user_id: &str, token: &str) -> Result<()> {
        self.admin_repo().set_token(user_id, token).await
    }

    pub async fn find_admin_by_token(&self, token: &str) -> Result<Option<Admin>> {
        self.admin_repo().find_by_token(token).await
    }
}
