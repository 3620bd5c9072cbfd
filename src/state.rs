use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::{CloudinaryStore, LocalPhotoStore, PhotoStore};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AttendanceService, AuthService, LifecycleService, SeaOrmAttendanceService, SeaOrmAuthService,
    SeaOrmStudentService, StudentService,
};

/// Everything the request handlers and the scheduler share.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub photos: Arc<dyn PhotoStore>,

    pub clock: Arc<dyn Clock>,

    pub auth_service: Arc<dyn AuthService>,

    pub student_service: Arc<dyn StudentService>,

    pub attendance_service: Arc<dyn AttendanceService>,

    pub lifecycle: LifecycleService,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::with_parts(config, store, None, clock)
    }

    /// Wires the state from pre-built parts. Tests use this to inject an
    /// in-memory store, a temp-dir photo store and a pinned clock.
    pub fn with_parts(
        config: Config,
        store: Store,
        photos: Option<Arc<dyn PhotoStore>>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let photos = match photos {
            Some(photos) => photos,
            None => build_photo_store(&config)?,
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        ));

        let student_service: Arc<dyn StudentService> = Arc::new(SeaOrmStudentService::new(
            store.clone(),
            Arc::clone(&photos),
            Arc::clone(&clock),
            config.security.clone(),
        ));

        let attendance_service: Arc<dyn AttendanceService> = Arc::new(
            SeaOrmAttendanceService::new(store.clone(), Arc::clone(&clock)),
        );

        let lifecycle = LifecycleService::new(store.clone());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            photos,
            clock,
            auth_service,
            student_service,
            attendance_service,
            lifecycle,
        })
    }
}

fn build_photo_store(config: &Config) -> anyhow::Result<Arc<dyn PhotoStore>> {
    match config.photos.provider.as_str() {
        "cloudinary" => {
            let store = CloudinaryStore::new(&config.photos)
                .map_err(|e| anyhow::anyhow!("Cloudinary misconfigured: {e}"))?;
            info!("Photo store: cloudinary ({})", config.photos.cloudinary_cloud_name);
            Ok(Arc::new(store))
        }
        "local" => {
            info!("Photo store: local directory {}", config.photos.local_path);
            Ok(Arc::new(LocalPhotoStore::new(&config.photos.local_path)))
        }
        other => anyhow::bail!("Unknown photo store provider '{other}'"),
    }
}
