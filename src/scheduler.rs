use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::state::SharedState;

/// Drives the three nightly jobs: the absentee sweep, the expired-student
/// purge and the stale-attendance cleanup. Each fires on its own cron
/// expression from the scheduler config.
pub struct Scheduler {
    state: SharedState,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(state: SharedState, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        sched
            .add(self.job(&self.config.absentee_cron, JobKind::AbsenteeSweep)?)
            .await?;
        sched
            .add(self.job(&self.config.expiry_cron, JobKind::ExpiryPurge)?)
            .await?;
        sched
            .add(self.job(&self.config.cleanup_cron, JobKind::AttendanceCleanup)?)
            .await?;

        sched.start().await?;

        info!(
            "Scheduler running (absentees: {}, expiry: {}, cleanup: {})",
            self.config.absentee_cron, self.config.expiry_cron, self.config.cleanup_cron
        );

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    fn job(&self, cron_expr: &str, kind: JobKind) -> Result<Job> {
        let state = self.state.clone();
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = state.clone();
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if let Err(e) = run_job(&state, kind).await {
                    error!("Scheduled {} failed: {}", kind.name(), e);
                }
            })
        })?;

        Ok(job)
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs all three jobs back to back, outside any cron schedule.
    pub async fn run_once(&self) -> Result<()> {
        info!("Running maintenance jobs manually...");
        run_job(&self.state, JobKind::AbsenteeSweep).await?;
        run_job(&self.state, JobKind::ExpiryPurge).await?;
        run_job(&self.state, JobKind::AttendanceCleanup).await?;
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum JobKind {
    AbsenteeSweep,
    ExpiryPurge,
    AttendanceCleanup,
}

impl JobKind {
    const fn name(self) -> &'static str {
        match self {
            Self::AbsenteeSweep => "absentee sweep",
            Self::ExpiryPurge => "expiry purge",
            Self::AttendanceCleanup => "attendance cleanup",
        }
    }
}

async fn run_job(state: &SharedState, kind: JobKind) -> Result<()> {
    let today = state.clock.today();
    match kind {
        JobKind::AbsenteeSweep => {
            state.lifecycle.sweep_absentees(today).await?;
        }
        JobKind::ExpiryPurge => {
            state.lifecycle.purge_expired_students(today).await?;
        }
        JobKind::AttendanceCleanup => {
            let retention_days = state.config.read().await.retention.attendance_days;
            state.lifecycle.purge_old_attendance(today, retention_days).await?;
        }
    }
    Ok(())
}
