use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse};
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAnswersRequest {
    pub user_id: String,
    pub answer1: String,
    pub answer2: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub user_id: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Bearer-token middleware for the admin surface. Accepts the token from
/// `Authorization: Bearer <token>` or `X-Api-Key`.
pub async fn auth_middleware(
    State(state): State<Arc<SharedState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(&headers)
        && let Ok(Some(user_id)) = state.auth_service.verify_token(&token).await
    {
        tracing::Span::current().record("user_id", &user_id);
        return Ok(next.run(request).await);
    }

    Err(ApiError::Unauthorized("Unauthorized".to_string()))
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<SharedState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.auth_service.login(&req.user_id, &req.password).await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user_id: result.user_id,
        token: result.token,
    })))
}

/// POST /auth/verify-answers
pub async fn verify_answers(
    State(state): State<Arc<SharedState>>,
    Json(req): Json<VerifyAnswersRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_service
        .verify_recovery_answers(&req.user_id, &req.answer1, &req.answer2)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Answers verified".to_string(),
    })))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<SharedState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_service
        .reset_password(&req.user_id, &req.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated".to_string(),
    })))
}
