use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tower::ServiceExt;

use rollcall::clients::LocalPhotoStore;
use rollcall::clock::FixedClock;
use rollcall::config::Config;
use rollcall::db::Store;
use rollcall::state::SharedState;

const MAINTENANCE_KEY: &str = "test-maintenance-key";
const BOUNDARY: &str = "----rollcall-test-boundary";

/// Every app runs against today = 2024-03-15.
fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.maintenance_key = MAINTENANCE_KEY.to_string();
    // Keep PIN hashing cheap in tests.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> Router {
    spawn_app_with_photo_dir().await.0
}

async fn spawn_app_with_photo_dir() -> (Router, std::path::PathBuf) {
    let config = test_config();

    let store = Store::new(&config.general.database_path)
        .await
        .expect("Failed to open in-memory store");

    let photo_dir = std::env::temp_dir().join(format!(
        "rollcall-test-photos-{}",
        rollcall::db::repositories::admin::generate_token()
    ));
    let photos = Arc::new(LocalPhotoStore::new(photo_dir.clone()));

    let state = SharedState::with_parts(
        config,
        store,
        Some(photos),
        Arc::new(FixedClock::at(test_today())),
    )
    .expect("Failed to wire state");

    (rollcall::api::router(Arc::new(state)).await, photo_dir)
}

fn stored_photo_count(photo_dir: &std::path::Path) -> usize {
    std::fs::read_dir(photo_dir).map_or(0, Iterator::count)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({"userId": "admin", "password": "password"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["token"].as_str().unwrap().to_string()
}

/// Builds a multipart form body with the given text fields plus a photo part.
fn multipart_body(fields: &[(&str, &str)], photo: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, bytes)) = photo {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"photo\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: &str, uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn create_student(app: &Router, token: &str, roll: &str) -> axum::response::Response {
    let body = multipart_body(
        &[
            ("roll", roll),
            ("name", "john doe"),
            ("branch", "CSE"),
            ("dob", "2003-07-21"),
            ("issue_valid", "21-24"),
            ("pin", "1234"),
        ],
        Some(("photo.jpg", b"fake image bytes")),
    );

    app.clone()
        .oneshot(multipart_request("POST", "/students", token, body))
        .await
        .unwrap()
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = spawn_app().await;

    for payload in [
        serde_json::json!({"userId": "admin", "password": "wrong"}),
        serde_json::json!({"userId": "nobody", "password": "password"}),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("/auth/login", payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/students?roll=CS21B001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login(&app).await;
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/students")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_student_normalizes_and_rejects_duplicates() {
    let (app, photo_dir) = spawn_app_with_photo_dir().await;
    let token = login(&app).await;

    let response = create_student(&app, &token, "cs21b001").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["roll"], "CS21B001");
    assert_eq!(json["data"]["name"], "John Doe");
    assert_eq!(json["data"]["issuedAt"], "2024-03-15");
    assert_eq!(stored_photo_count(&photo_dir), 1);

    // Same roll in another casing still conflicts, and the rejected
    // upload must not leave a second photo behind.
    let response = create_student(&app, &token, "CS21B001").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(stored_photo_count(&photo_dir), 1);
}

#[tokio::test]
async fn create_student_validates_pin_and_window() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let body = multipart_body(
        &[
            ("roll", "CS21B002"),
            ("name", "jane roe"),
            ("branch", "ECE"),
            ("dob", "2003-01-02"),
            ("issue_valid", "21-24"),
            ("pin", "12a4"),
        ],
        Some(("photo.jpg", b"bytes")),
    );
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/students", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = multipart_body(
        &[
            ("roll", "CS21B002"),
            ("name", "jane roe"),
            ("branch", "ECE"),
            ("dob", "2003-01-02"),
            ("issue_valid", "garbage"),
            ("pin", "1234"),
        ],
        Some(("photo.jpg", b"bytes")),
    );
    let response = app
        .clone()
        .oneshot(multipart_request("POST", "/students", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_student_applies_partial_changes() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let response = create_student(&app, &token, "CS21B003").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = multipart_body(&[("branch", "EEE")], None);
    let response = app
        .clone()
        .oneshot(multipart_request("PUT", "/students/CS21B003", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["student"]["branch"], "EEE");
    assert_eq!(json["data"]["student"]["name"], "John Doe");
    assert_eq!(json["data"]["photoCleanup"], "clean");

    let body = multipart_body(&[("branch", "IT")], None);
    let response = app
        .clone()
        .oneshot(multipart_request("PUT", "/students/GHOST", &token, body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_and_delete_student() {
    let app = spawn_app().await;
    let token = login(&app).await;

    create_student(&app, &token, "CS21B004").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/students/cs21b004")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/students/CS21B004")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/students/CS21B004")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mark_attendance_is_idempotent_per_day() {
    let app = spawn_app().await;
    let token = login(&app).await;
    create_student(&app, &token, "CS21B005").await;

    let payload = serde_json::json!({
        "roll": "cs21b005",
        "date": "2024-03-15",
        "time": "09:02:11",
    });

    let response = app
        .clone()
        .oneshot(json_request("/attendance/mark", payload.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["alreadyMarked"], false);

    let response = app
        .clone()
        .oneshot(json_request("/attendance/mark", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["alreadyMarked"], true);
}

#[tokio::test]
async fn mark_attendance_rejects_other_dates_and_unknown_rolls() {
    let app = spawn_app().await;
    let token = login(&app).await;
    create_student(&app, &token, "CS21B006").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/attendance/mark",
            serde_json::json!({"roll": "CS21B006", "date": "2024-03-14"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "/attendance/mark",
            serde_json::json!({"roll": "GHOST", "date": "2024-03-15"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attendance_listing_requires_a_roll() {
    let app = spawn_app().await;
    let token = login(&app).await;
    create_student(&app, &token, "CS21B007").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/attendance")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.clone()
        .oneshot(json_request(
            "/attendance/mark",
            serde_json::json!({"roll": "CS21B007", "date": "2024-03-15"}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/attendance?roll=cs21b007&orderBy=date")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "Present");
}

#[tokio::test]
async fn student_listing_filters_and_paginates() {
    let app = spawn_app().await;
    let token = login(&app).await;

    for roll in ["CS21B010", "CS21B011", "CS21B012"] {
        let response = create_student(&app, &token, roll).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/students?name=john&page=1&pageSize=2")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/students?roll=cs21b012")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["roll"], "CS21B012");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/students?branch=MECH")
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn student_listing_survives_extreme_pagination() {
    let app = spawn_app().await;
    let token = login(&app).await;

    let response = create_student(&app, &token, "CS21B013").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/students?page={max}&pageSize={max}",
                    max = u64::MAX
                ))
                .header("X-Api-Key", &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
}

#[tokio::test]
async fn recovery_flow_verifies_answers_then_resets() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/auth/verify-answers",
            serde_json::json!({"userId": "ghost", "answer1": "a", "answer2": "b"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "/auth/verify-answers",
            serde_json::json!({"userId": "admin", "answer1": "wrong", "answer2": "changeme2"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "/auth/verify-answers",
            serde_json::json!({"userId": "admin", "answer1": "changeme1", "answer2": "changeme2"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "/auth/reset-password",
            serde_json::json!({"userId": "admin", "newPassword": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({"userId": "admin", "password": "password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "/auth/login",
            serde_json::json!({"userId": "admin", "password": "hunter22"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn task_endpoints_are_gated_by_the_maintenance_key() {
    let app = spawn_app().await;
    let token = login(&app).await;
    create_student(&app, &token, "CS21B020").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tasks/mark-absent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tasks/mark-absent")
                .header("X-Maintenance-Key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tasks/mark-absent")
                .header("X-Maintenance-Key", MAINTENANCE_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["affected"], 1);

    for uri in [
        "/tasks/delete-expired-students",
        "/tasks/cleanup-old-attendance",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("X-Maintenance-Key", MAINTENANCE_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
