//! Domain service for admin authentication and credential recovery.

use serde::Serialize;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Uniform failure for login: unknown user and wrong password are not
    /// distinguished, to avoid user enumeration.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Admin not found")]
    AdminNotFound,

    #[error("Wrong answers")]
    WrongAnswers,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Login result: the bearer token the client presents from now on.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: String,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails, regardless
    /// of which check failed.
    async fn login(&self, user_id: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token to the admin holding it, if any.
    async fn verify_token(&self, token: &str) -> Result<Option<String>, AuthError>;

    /// First half of the recovery flow: exact-equality check of both answers.
    async fn verify_recovery_answers(
        &self,
        user_id: &str,
        answer1: &str,
        answer2: &str,
    ) -> Result<(), AuthError>;

    /// Second half of the recovery flow: rehash and store a new password.
    async fn reset_password(&self, user_id: &str, new_password: &str) -> Result<(), AuthError>;
}
