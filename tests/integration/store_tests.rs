//! File-backed store tests.
//!
//! Tests verify:
//! - Data survives closing and reopening the database file
//! - Databases created without the `status` column are upgraded in place
//! - Listings return stored rows as-is, including values the API never writes

use axum::http::StatusCode;
use serde_json::json;

use attendance_api::store::SqliteDatabase;

use super::test_utils::{body_json, get, mark_body, post_json, router_over, student_body};

#[tokio::test]
async fn test_data_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance.sqlite3");

    {
        let router = router_over(SqliteDatabase::open(&path).unwrap());
        post_json(&router, "/api/register_student", student_body("S1", "Ann", "10A")).await;
        let response = post_json(
            &router,
            "/api/mark_attendance",
            mark_body("S1", "Ann", "10A", "2024-01-01", "08:00:00"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let router = router_over(SqliteDatabase::open(&path).unwrap());

    let json = body_json(get(&router, "/api/get_students").await).await;
    assert_eq!(json["data"][0]["student_id"], "S1");

    // Uniqueness is enforced by the persisted schema
    let response = post_json(
        &router,
        "/api/mark_attendance",
        mark_body("S1", "Ann", "10A", "2024-01-01", "09:00:00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_legacy_attendance_table_is_upgraded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.sqlite3");

    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE attendance_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id TEXT NOT NULL,
                student_name TEXT NOT NULL,
                class TEXT NOT NULL,
                attendance_date TEXT NOT NULL,
                attendance_time TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(student_id, attendance_date)
            );
            INSERT INTO attendance_records
                (student_id, student_name, class, attendance_date, attendance_time)
                VALUES ('S1', 'Ann', '10A', '2024-01-01', '08:00:00');",
        )
        .unwrap();
    }

    let router = router_over(SqliteDatabase::open(&path).unwrap());
    post_json(&router, "/api/register_student", student_body("S1", "Ann", "10A")).await;

    let json = body_json(get(&router, "/api/get_attendance_records?date=2024-01-01").await).await;
    assert_eq!(json["data"][0]["status"], "present");

    let json = body_json(get(&router, "/api/get_statistics?date=2024-01-01").await).await;
    assert_eq!(
        json["data"],
        json!({
            "total_students": 1,
            "present_students": 1,
            "absent_students": 0,
            "attendance_rate": 100
        })
    );
}

#[tokio::test]
async fn test_listings_return_stored_rows_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("imported.sqlite3");

    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE students (
                student_id TEXT PRIMARY KEY,
                student_name TEXT NOT NULL,
                class TEXT NOT NULL,
                qr_code TEXT,
                guardian TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO students (student_id, student_name, class, qr_code, guardian)
                VALUES ('S1', 'Ann', '10A', NULL, 'Mary');",
        )
        .unwrap();
    }

    let router = router_over(SqliteDatabase::open(&path).unwrap());

    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO attendance_records
                (student_id, student_name, class, attendance_date, attendance_time, status)
                VALUES ('S1', 'Ann', '10A', '2024-01-01', '08:00:00', 'Present')",
            [],
        )
        .unwrap();
    }

    let response = get(&router, "/api/get_students").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let student = &json["data"][0];
    assert_eq!(student["student_id"], "S1");
    assert_eq!(student["qr_code"], serde_json::Value::Null);
    assert_eq!(student["guardian"], "Mary");

    let response = get(&router, "/api/get_attendance_records?date=2024-01-01").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["status"], "Present");
    assert!(json["data"][0]["id"].is_i64());
}
