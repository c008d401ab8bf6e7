//! Router configuration for the attendance API.
//!
//! # Route Structure
//!
//! ```text
//! /api/register_student          POST  - Register a student
//! /api/student_attendance        POST  - Register a student (legacy path)
//! /api/student_attendance        GET   - Health probe
//! /api/mark_attendance           POST  - Mark present
//! /api/mark_absent               POST  - Mark absent
//! /api/get_students              GET   - List students
//! /api/get_attendance_records    GET   - Records for a date
//! /api/get_statistics            GET   - Daily statistics
//! /api/remove_student            POST  - Remove a student
//! /api/, /api/*                  *     - JSON 404
//! /*                             GET   - Static front-end, if configured
//! ```
//!
//! Every response, including preflights and static files, carries the CORS
//! header set.
//!
//! # Example
//!
//! ```ignore
//! use attendance_api::server::{create_router, AppState, RouterConfig};
//! use attendance_api::{AttendanceService, SqliteDatabase};
//!
//! let db = SqliteDatabase::open("attendance.sqlite3")?;
//! let state = AppState::new(AttendanceService::new(db));
//! let router = create_router(state, RouterConfig::new().with_static_dir("public"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8787").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    middleware,
    routing::{any, get, post, MethodRouter},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::cors::cors_middleware;
use super::handlers::{
    attendance_records_handler, health_handler, list_students_handler, mark_absent_handler,
    mark_attendance_handler, not_found_handler, register_student_handler, remove_student_handler,
    require_database, statistics_handler, AppState,
};
use crate::store::Database;

/// Path prefix under which all API operations live.
pub const API_PREFIX: &str = "/api";

/// The bare prefix with its trailing slash.
const API_ROOT: &str = "/api/";

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Directory served for non-API paths
    pub static_dir: Option<PathBuf>,
}

impl RouterConfig {
    /// Tracing on, no static directory.
    pub fn new() -> Self {
        Self {
            enable_tracing: true,
            static_dir: None,
        }
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Serve a directory for paths outside the API prefix.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Layer order, outermost first: tracing, CORS (answers `OPTIONS` itself),
/// then for `/api` the bound-store check, routing and the JSON 404 fallback.
pub fn create_router<D>(state: AppState<D>, config: RouterConfig) -> Router
where
    D: Database + 'static,
{
    let router = Router::new()
        .nest(API_PREFIX, build_api_router(state.clone()))
        .route(API_ROOT, build_api_root(state));

    // Non-API paths
    let router = match config.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(|| async { StatusCode::NOT_FOUND }),
    };

    let router = router.layer(middleware::from_fn(cors_middleware));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the `/api` router.
///
/// A method not listed for a path falls through to the JSON 404 rather than
/// axum's default 405.
fn build_api_router<D>(state: AppState<D>) -> Router
where
    D: Database + 'static,
{
    Router::new()
        .route(
            "/register_student",
            post(register_student_handler::<D>).fallback(not_found_handler),
        )
        .route(
            "/student_attendance",
            get(health_handler)
                .post(register_student_handler::<D>)
                .fallback(not_found_handler),
        )
        .route(
            "/mark_attendance",
            post(mark_attendance_handler::<D>).fallback(not_found_handler),
        )
        .route(
            "/mark_absent",
            post(mark_absent_handler::<D>).fallback(not_found_handler),
        )
        .route(
            "/get_students",
            get(list_students_handler::<D>).fallback(not_found_handler),
        )
        .route(
            "/get_attendance_records",
            get(attendance_records_handler::<D>).fallback(not_found_handler),
        )
        .route(
            "/get_statistics",
            get(statistics_handler::<D>).fallback(not_found_handler),
        )
        .route(
            "/remove_student",
            post(remove_student_handler::<D>).fallback(not_found_handler),
        )
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_database::<D>,
        ))
        .with_state(state)
}

/// `/api/` is not matched by the nested router, so it carries its own
/// bound-store check and JSON 404.
fn build_api_root<D>(state: AppState<D>) -> MethodRouter
where
    D: Database + 'static,
{
    any(not_found_handler).layer(middleware::from_fn_with_state(
        state,
        require_database::<D>,
    ))
}

// =============================================================================
// Tests
// =============================================================================
