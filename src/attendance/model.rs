//! Records exchanged between the store, the service and HTTP callers.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Value of `class` that disables class filtering when listing students.
pub const ALL_CLASSES: &str = "all";

/// Attendance outcome recorded for a student on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    /// The value stored in the `status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }
}

/// A registered student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Externally supplied identifier (usually the scanned code value)
    pub student_id: String,

    pub student_name: String,

    /// Cohort or section label
    #[serde(rename = "class")]
    pub class_name: String,

    /// Opaque encoded identifier printed for scanning
    pub qr_code: String,

    /// Set by the store on insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Student {
    pub fn new(
        student_id: impl Into<String>,
        student_name: impl Into<String>,
        class_name: impl Into<String>,
        qr_code: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            student_name: student_name.into(),
            class_name: class_name.into(),
            qr_code: qr_code.into(),
            created_at: None,
        }
    }
}

/// One attendance entry for a (student, date) pair.
///
/// Name and class are copies taken when the entry is marked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Row id assigned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    pub student_id: String,

    pub student_name: String,

    #[serde(rename = "class")]
    pub class_name: String,

    pub attendance_date: String,

    pub attendance_time: String,

    pub status: AttendanceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl AttendanceRecord {
    pub fn new(
        student_id: impl Into<String>,
        student_name: impl Into<String>,
        class_name: impl Into<String>,
        attendance_date: impl Into<String>,
        attendance_time: impl Into<String>,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            id: None,
            student_id: student_id.into(),
            student_name: student_name.into(),
            class_name: class_name.into(),
            attendance_date: attendance_date.into(),
            attendance_time: attendance_time.into(),
            status,
            created_at: None,
        }
    }
}

/// Daily attendance figures returned by the statistics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStatistics {
    pub total_students: i64,
    pub present_students: i64,
    pub absent_students: i64,
    /// Whole percentage of students present, 0 when there are no students
    pub attendance_rate: i64,
}

impl AttendanceStatistics {
    /// Derive the absent count and rate from the two store counts.
    pub fn from_counts(total_students: i64, present_students: i64) -> Self {
        let attendance_rate = if total_students > 0 {
            (present_students as f64 / total_students as f64 * 100.0).round() as i64
        } else {
            0
        };

        Self {
            total_students,
            present_students,
            absent_students: total_students - present_students,
            attendance_rate,
        }
    }
}

/// Normalize the optional `class` filter: absent, empty and `all` mean no filter.
pub fn class_filter(class: Option<&str>) -> Option<&str> {
    class.filter(|c| !c.is_empty() && *c != ALL_CLASSES)
}

/// Current local wall-clock time as `HH:MM:SS`.
pub fn wall_clock_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
