use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub mod attendance;
pub mod auth;
mod error;
pub mod students;
pub mod system;
pub mod tasks;
mod types;

pub use error::ApiError;
pub use types::*;

/// Builds the full application router.
///
/// The student and attendance-listing surface sits behind bearer-token auth;
/// login, recovery, the scanner-facing mark endpoint and the shared-secret
/// task endpoints stay outside it.
pub async fn router(state: Arc<SharedState>) -> Router {
    let (photos_provider, photos_path, cors_origins) = {
        let config = state.config.read().await;
        (
            config.photos.provider.clone(),
            config.photos.local_path.clone(),
            config.server.cors_allowed_origins.clone(),
        )
    };

    let protected = Router::new()
        .route("/students", get(students::list_students))
        .route("/students", post(students::create_student))
        .route("/students/{roll}", get(students::get_student))
        .route("/students/{roll}", put(students::update_student))
        .route("/students/{roll}", delete(students::delete_student))
        .route("/attendance", get(attendance::list_attendance))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    let mut app = Router::new()
        .merge(protected)
        .route("/health", get(system::health))
        .route("/auth/login", post(auth::login))
        .route("/auth/verify-answers", post(auth::verify_answers))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/attendance/mark", post(attendance::mark_attendance))
        .route("/tasks/mark-absent", post(tasks::mark_absent))
        .route(
            "/tasks/delete-expired-students",
            post(tasks::delete_expired_students),
        )
        .route(
            "/tasks/cleanup-old-attendance",
            post(tasks::cleanup_old_attendance),
        )
        .with_state(state);

    if photos_provider == "local" {
        app = app.nest_service(
            "/photos",
            tower_http::services::ServeDir::new(photos_path),
        );
    }

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    app.layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
