use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::admins;

/// Admin data returned from the repository, without the password hash.
#[derive(Debug, Clone)]
pub struct Admin {
    pub user_id: String,
    pub answer1: String,
    pub answer2: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<admins::Model> for Admin {
    fn from(model: admins::Model) -> Self {
        Self {
            user_id: model.user_id,
            answer1: model.answer1,
            answer2: model.answer2,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct AdminRepository {
    conn: DatabaseConnection,
}

impl AdminRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<Admin>> {
        let admin = admins::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query admin")?;

        Ok(admin.map(Admin::from))
    }

    /// Verify a password for an admin.
    /// Note: This uses `spawn_blocking` because Argon2 verification is
    /// CPU-intensive and would block the async runtime if run directly.
    pub async fn verify_password(&self, user_id: &str, password: &str) -> Result<bool> {
        let admin = admins::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for password verification")?;

        let Some(admin) = admin else {
            return Ok(false);
        };

        let password_hash = admin.password_hash;
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    /// Rehashes and stores a new password for an admin.
    pub async fn update_password(
        &self,
        user_id: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<bool> {
        let admin = admins::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for password update")?;

        let Some(admin) = admin else {
            return Ok(false);
        };

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_secret(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: admins::ActiveModel = admin.into();
        active.password_hash = Set(new_hash);
        active.api_token = Set(None);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Stores a freshly issued bearer token for an admin.
    pub async fn set_token(&self, user_id: &str, token: &str) -> Result<()> {
        let admin = admins::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query admin for token issue")?
            .ok_or_else(|| anyhow::anyhow!("Admin not found: {user_id}"))?;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: admins::ActiveModel = admin.into();
        active.api_token = Set(Some(token.to_string()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Resolves a bearer token to the admin holding it.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Admin>> {
        let admin = admins::Entity::find()
            .filter(admins::Column::ApiToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query admin by token")?;

        Ok(admin.map(Admin::from))
    }
}

/// Hash a secret (admin password or student PIN) using Argon2id with
/// optional custom params. `None` uses the library defaults.
pub fn hash_secret(secret: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash secret: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random bearer token (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    hex::encode(bytes)
}
