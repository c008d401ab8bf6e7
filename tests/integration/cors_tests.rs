//! CORS integration tests.
//!
//! Every response carries the same three headers, and `OPTIONS` is answered
//! with an empty 204 on any path.

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use serde_json::json;

use attendance_api::store::SqliteDatabase;
use attendance_api::{create_router, AppState, RouterConfig};

use super::test_utils::{get, post_json, send, student_body, test_router, test_router_config};

fn assert_cors_headers(response: &Response<Body>) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}

fn options(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri(uri)
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_preflight_returns_no_content() {
    let router = test_router();

    for uri in [
        "/api/register_student",
        "/api/get_students",
        "/api/does_not_exist",
        "/api/",
        "/index.html",
    ] {
        let response = send(&router, options(uri)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_cors_headers(&response);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}

#[tokio::test]
async fn test_preflight_bypasses_unbound_store() {
    let state: AppState<SqliteDatabase> = AppState::unbound();
    let router = create_router(state, test_router_config());

    let response = send(&router, options("/api/get_students")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_headers_on_success_and_error_responses() {
    let router = test_router();

    let response = get(&router, "/api/student_attendance").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);

    let response = post_json(&router, "/api/register_student", student_body("S1", "Ann", "10A")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);

    let response = post_json(&router, "/api/mark_attendance", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_cors_headers(&response);

    let response = get(&router, "/api/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors_headers(&response);

    let response = get(&router, "/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_cors_headers(&response);
}

#[tokio::test]
async fn test_static_directory_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>Attendance</h1>").unwrap();

    let db = SqliteDatabase::open_in_memory().unwrap();
    let state = AppState::new(attendance_api::AttendanceService::new(db));
    let config = RouterConfig::new()
        .with_tracing(false)
        .with_static_dir(dir.path());
    let router = create_router(state, config);

    let response = get(&router, "/index.html").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<h1>Attendance</h1>");

    let response = get(&router, "/missing.js").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // API paths never reach the static directory
    let response = get(&router, "/api/index.html").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "API endpoint not found");
}
