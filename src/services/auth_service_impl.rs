//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::Store;
use crate::db::repositories::admin::generate_token;
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use async_trait::async_trait;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, user_id: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user_id = user_id.trim().to_lowercase();

        let is_valid = self.store.verify_admin_password(&user_id, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        self.store.set_admin_token(&user_id, &token).await?;

        Ok(LoginResult { user_id, token })
    }

    async fn verify_token(&self, token: &str) -> Result<Option<String>, AuthError> {
        let admin = self.store.find_admin_by_token(token).await?;
        Ok(admin.map(|a| a.user_id))
    }

    async fn verify_recovery_answers(
        &self,
        user_id: &str,
        answer1: &str,
        answer2: &str,
    ) -> Result<(), AuthError> {
        let user_id = user_id.trim().to_lowercase();

        let admin = self
            .store
            .get_admin(&user_id)
            .await?
            .ok_or(AuthError::AdminNotFound)?;

        // Exact string equality, no case-folding. A documented weak point
        // carried over from the legacy recovery flow.
        if admin.answer1 != answer1 || admin.answer2 != answer2 {
            return Err(AuthError::WrongAnswers);
        }

        Ok(())
    }

    async fn reset_password(&self, user_id: &str, new_password: &str) -> Result<(), AuthError> {
        if new_password.is_empty() {
            return Err(AuthError::Validation("Password cannot be empty".to_string()));
        }

        let user_id = user_id.trim().to_lowercase();

        let updated = self
            .store
            .update_admin_password(&user_id, new_password, &self.security)
            .await?;

        if !updated {
            return Err(AuthError::AdminNotFound);
        }

        Ok(())
    }
}
