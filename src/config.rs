use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub photos: PhotoStoreConfig,

    pub scheduler: SchedulerConfig,

    pub retention: RetentionConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/rollcall.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Shared secret for the maintenance endpoints (X-Maintenance-Key).
    /// Empty disables the endpoints entirely.
    pub maintenance_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7070,
            cors_allowed_origins: vec!["*".to_string()],
            maintenance_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoStoreConfig {
    /// "local" or "cloudinary"
    pub provider: String,

    /// Directory for the local provider; served under /photos.
    pub local_path: String,

    pub cloudinary_cloud_name: String,

    pub cloudinary_api_key: String,

    pub cloudinary_api_secret: String,

    /// Remote folder uploads are placed in.
    pub upload_folder: String,
}

impl Default for PhotoStoreConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            local_path: "photos".to_string(),
            cloudinary_cloud_name: String::new(),
            cloudinary_api_key: String::new(),
            cloudinary_api_secret: String::new(),
            upload_folder: "students".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Absentee sweep; runs after the attendance-taking window closes.
    pub absentee_cron: String,

    /// Expired-student purge.
    pub expiry_cron: String,

    /// Stale-attendance purge.
    pub cleanup_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            absentee_cron: "0 5 12 * * *".to_string(),
            expiry_cron: "0 0 0 * * *".to_string(),
            cleanup_cron: "0 30 0 * * *".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Attendance rows strictly older than this many days are purged.
    pub attendance_days: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            attendance_days: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = Self::default_config_path();

        let mut config = if path.exists() {
            info!("Loading config from: {}", path.display());
            Self::load_from_path(&path)?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets can come from the environment (or a `.env` file) instead of
    /// the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CLOUDINARY_CLOUD_NAME") {
            self.photos.cloudinary_cloud_name = v;
        }
        if let Ok(v) = std::env::var("CLOUDINARY_API_KEY") {
            self.photos.cloudinary_api_key = v;
        }
        if let Ok(v) = std::env::var("CLOUDINARY_API_SECRET") {
            self.photos.cloudinary_api_secret = v;
        }
        if let Ok(v) = std::env::var("ROLLCALL_MAINTENANCE_KEY") {
            self.server.maintenance_key = v;
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        match self.photos.provider.as_str() {
            "local" => {}
            "cloudinary" => {
                if self.photos.cloudinary_cloud_name.is_empty()
                    || self.photos.cloudinary_api_key.is_empty()
                    || self.photos.cloudinary_api_secret.is_empty()
                {
                    anyhow::bail!("Cloudinary credentials are required for the cloudinary provider");
                }
            }
            other => anyhow::bail!("Unknown photo provider: {other}"),
        }

        if self.retention.attendance_days == 0 {
            anyhow::bail!("Attendance retention must be at least one day");
        }

        Ok(())
    }
}
