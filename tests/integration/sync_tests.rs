//! Spreadsheet sync integration tests.
//!
//! Tests verify:
//! - Which operations produce sync rows
//! - Sync failures never change the API response
//! - The Google Sheets client's wire format, against a local fake API

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use attendance_api::sync::{GoogleSheetsSync, SheetSync, SyncRecord};
use attendance_api::{AttendanceRecord, AttendanceStatus, Student};

use super::test_utils::{
    absent_body, body_json, mark_body, post_json, router_with_sync, student_body, FailingSync,
    RecordingSync,
};

// =============================================================================
// Dispatch from Handlers
// =============================================================================

#[tokio::test]
async fn test_writes_are_synced() {
    let sink = RecordingSync::new();
    let router = router_with_sync(sink.clone());

    post_json(&router, "/api/register_student", student_body("S1", "Ann", "10A")).await;
    post_json(
        &router,
        "/api/mark_attendance",
        mark_body("S1", "Ann", "10A", "2024-01-01", "08:00:00"),
    )
    .await;
    post_json(
        &router,
        "/api/mark_absent",
        absent_body("S1", "Ann", "10A", "2024-01-02"),
    )
    .await;

    let records = sink.wait_for(3).await;
    assert_eq!(records.len(), 3);

    let students: Vec<&SyncRecord> = records
        .iter()
        .filter(|r| matches!(r, SyncRecord::Student(_)))
        .collect();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].sheet(), "students");

    let mut dates: Vec<String> = records
        .iter()
        .filter_map(|r| match r {
            SyncRecord::Attendance(a) => Some(a.attendance_date.clone()),
            SyncRecord::Student(_) => None,
        })
        .collect();
    dates.sort();
    assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
}

#[tokio::test]
async fn test_rejected_writes_are_not_synced() {
    let sink = RecordingSync::new();
    let router = router_with_sync(sink.clone());

    post_json(&router, "/api/register_student", student_body("S1", "Ann", "10A")).await;
    let mark = mark_body("S1", "Ann", "10A", "2024-01-01", "08:00:00");
    post_json(&router, "/api/mark_attendance", mark.clone()).await;
    assert_eq!(sink.wait_for(2).await.len(), 2);

    // Duplicate registration, duplicate mark, invalid body
    post_json(&router, "/api/register_student", student_body("S1", "Ann", "10A")).await;
    post_json(&router, "/api/mark_attendance", mark).await;
    post_json(&router, "/api/mark_absent", json!({"student_id": "S1"})).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sink.records.lock().await.len(), 2);
}

#[tokio::test]
async fn test_sync_failure_does_not_affect_response() {
    let router = router_with_sync(FailingSync);

    let response = post_json(&router, "/api/register_student", student_body("S1", "Ann", "10A")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));

    let response = post_json(
        &router,
        "/api/mark_attendance",
        mark_body("S1", "Ann", "10A", "2024-01-01", "08:00:00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"success": true}));
}

// =============================================================================
// Google Sheets Client
// =============================================================================

#[derive(Debug, Clone)]
struct CapturedAppend {
    spreadsheet_id: String,
    range: String,
    value_input_option: Option<String>,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct FakeSheets {
    captured: Arc<Mutex<Vec<CapturedAppend>>>,
    status: StatusCode,
}

async fn fake_append(
    State(fake): State<FakeSheets>,
    Path((spreadsheet_id, range)): Path<(String, String)>,
    Query(query): Query<std::collections::HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.captured.lock().await.push(CapturedAppend {
        spreadsheet_id,
        range,
        value_input_option: query.get("valueInputOption").cloned(),
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (fake.status, Json(json!({})))
}

/// Start a fake Sheets API and return its base URL.
async fn start_fake_sheets(status: StatusCode) -> (String, Arc<Mutex<Vec<CapturedAppend>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let fake = FakeSheets {
        captured: Arc::clone(&captured),
        status,
    };

    let app = Router::new()
        .route(
            "/v4/spreadsheets/{spreadsheet_id}/values/{range}",
            post(fake_append),
        )
        .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), captured)
}

#[tokio::test]
async fn test_google_sheets_append_wire_format() {
    let (endpoint, captured) = start_fake_sheets(StatusCode::OK).await;
    let sync = GoogleSheetsSync::with_endpoint(&endpoint, "sheet-1", "secret-token").unwrap();

    let record = SyncRecord::Attendance(AttendanceRecord::new(
        "S1",
        "Ann",
        "10A",
        "2024-01-01",
        "08:00:00",
        AttendanceStatus::Present,
    ));
    sync.append(&record).await.unwrap();

    let captured = captured.lock().await;
    assert_eq!(captured.len(), 1);
    let append = &captured[0];
    assert_eq!(append.spreadsheet_id, "sheet-1");
    assert_eq!(append.range, "attendance!A:Z:append");
    assert_eq!(append.value_input_option.as_deref(), Some("USER_ENTERED"));
    assert_eq!(append.authorization.as_deref(), Some("Bearer secret-token"));
    assert_eq!(
        append.body,
        json!({"values": [["S1", "Ann", "10A", "2024-01-01", "08:00:00"]]})
    );
}

#[tokio::test]
async fn test_google_sheets_student_row() {
    let (endpoint, captured) = start_fake_sheets(StatusCode::OK).await;
    let sync = GoogleSheetsSync::with_endpoint(&endpoint, "sheet-1", "token").unwrap();

    sync.append(&SyncRecord::Student(Student::new("S1", "Ann", "10A", "QR1")))
        .await
        .unwrap();

    let captured = captured.lock().await;
    assert_eq!(captured[0].range, "students!A:Z:append");
    let row = captured[0].body["values"][0].as_array().unwrap();
    assert_eq!(row.len(), 4);
    assert_eq!(row[0], "S1");
    assert_eq!(row[2], "10A");
}

#[tokio::test]
async fn test_google_sheets_error_status() {
    let (endpoint, _captured) = start_fake_sheets(StatusCode::FORBIDDEN).await;
    let sync = GoogleSheetsSync::with_endpoint(&endpoint, "sheet-1", "bad-token").unwrap();

    let err = sync
        .append(&SyncRecord::Student(Student::new("S1", "Ann", "10A", "QR1")))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        attendance_api::SyncError::Status { status: 403, .. }
    ));
}

#[tokio::test]
async fn test_google_sheets_unreachable() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sync =
        GoogleSheetsSync::with_endpoint(&format!("http://{}", addr), "sheet-1", "token").unwrap();
    let err = sync
        .append(&SyncRecord::Student(Student::new("S1", "Ann", "10A", "QR1")))
        .await
        .unwrap_err();
    assert!(matches!(err, attendance_api::SyncError::Request(_)));
}
