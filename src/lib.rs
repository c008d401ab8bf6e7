//! # Attendance API
//!
//! An HTTP JSON service for a school attendance system: register students,
//! record daily presence or absence, and report per-day statistics.
//!
//! ## Features
//!
//! - **Registration and marking**: one record per student per date, enforced by the store
//! - **Daily statistics**: totals, absentees and a rounded attendance rate
//! - **Uniform envelope**: every response carries `success`, failures add `message`
//! - **Permissive CORS**: a constant header set on every response, preflights answered directly
//! - **Spreadsheet sync**: optional best-effort append to Google Sheets
//!
//! ## Architecture
//!
//! - [`server`] - Axum router, handlers and CORS middleware
//! - [`attendance`] - Domain types and the attendance service
//! - [`store`] - The `Database` trait and its SQLite backend
//! - [`sync`] - Fire-and-forget spreadsheet sync
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use attendance_api::{create_router, AppState, AttendanceService, RouterConfig, SqliteDatabase};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = SqliteDatabase::open("attendance.sqlite3")?;
//!     let state = AppState::new(AttendanceService::new(db));
//!     let router = create_router(state, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8787").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod attendance;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use attendance::{
    AttendanceRecord, AttendanceService, AttendanceStatistics, AttendanceStatus, Registration,
    Student,
};
pub use config::Config;
pub use error::{ApiError, AttendanceError, StoreError, SyncError};
pub use server::{create_router, AppState, RouterConfig};
pub use store::{Database, Param, Row, SqliteDatabase};
pub use sync::{GoogleSheetsSync, SheetSync, SyncDispatcher, SyncRecord};
