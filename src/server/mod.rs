//! HTTP server layer for the attendance API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                GET/POST /api/{operation}                        │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │    cors     │  │        routes           │  │
//! │  │ (requests)  │  │ (headers)   │  │  (router config)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cors;
pub mod handlers;
pub mod routes;

pub use cors::{apply_cors_headers, cors_headers, cors_middleware};
pub use handlers::{
    attendance_records_handler, health_handler, list_students_handler, mark_absent_handler,
    mark_attendance_handler, not_found_handler, register_student_handler, remove_student_handler,
    require_database, statistics_handler, ApiResponse, AppState, DateQueryParams, HealthResponse,
    JsonBody, MarkAbsentBody, MarkAttendanceBody, QueryParams, RegisterStudentBody,
    RemoveStudentBody, StudentsQueryParams,
};
pub use routes::{create_router, RouterConfig, API_PREFIX};
