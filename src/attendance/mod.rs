//! Attendance domain layer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           AttendanceService             │
//! │  (queries, conflict interpretation)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            Database trait               │
//! │  (execute / fetch_one / fetch_all)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`AttendanceService`]: one method per API operation
//! - [`Student`], [`AttendanceRecord`]: rows as returned to callers
//! - [`AttendanceStatistics`]: daily totals and rate

mod model;
mod service;

pub use model::{
    class_filter, wall_clock_time, AttendanceRecord, AttendanceStatistics, AttendanceStatus,
    Student, ALL_CLASSES,
};
pub use service::{AttendanceService, Registration};
