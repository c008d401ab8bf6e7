//! Attendance service: the store queries behind every API operation.
//!
//! Each operation is one parameterized statement or a short fixed sequence of
//! them, awaited in order. The only store error given business meaning is
//! [`StoreError::Conflict`]:
//!
//! ```text
//! register_student   Conflict -> Registration::AlreadyRegistered
//! mark               Conflict -> AttendanceError::AlreadyMarked
//! everything else    StoreError -> AttendanceError::Store
//! ```

use serde_json::Value;
use tracing::debug;

use crate::error::{AttendanceError, StoreError};
use crate::store::{Database, Param, Row};

use super::model::{
    class_filter, AttendanceRecord, AttendanceStatistics, AttendanceStatus, Student,
};

const INSERT_STUDENT: &str =
    "INSERT INTO students (student_id, student_name, class, qr_code) VALUES (?, ?, ?, ?)";

const INSERT_ATTENDANCE: &str = "INSERT INTO attendance_records \
     (student_id, student_name, class, attendance_date, attendance_time, status) \
     VALUES (?, ?, ?, ?, ?, ?)";

const SELECT_STUDENTS: &str = "SELECT * FROM students ORDER BY student_name";

const SELECT_STUDENTS_BY_CLASS: &str =
    "SELECT * FROM students WHERE class = ? ORDER BY student_name";

const SELECT_ATTENDANCE_BY_DATE: &str =
    "SELECT * FROM attendance_records WHERE attendance_date = ? ORDER BY attendance_time DESC";

const COUNT_STUDENTS: &str = "SELECT COUNT(*) AS count FROM students";

const COUNT_PRESENT: &str =
    "SELECT COUNT(*) AS count FROM attendance_records WHERE attendance_date = ? AND status = ?";

const DELETE_STUDENT: &str = "DELETE FROM students WHERE student_id = ?";

const DELETE_STUDENT_ATTENDANCE: &str = "DELETE FROM attendance_records WHERE student_id = ?";

/// Outcome of a registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new student row was inserted
    Registered,

    /// The student id was already present; nothing was written
    AlreadyRegistered,
}

/// Service implementing the attendance operations over a [`Database`].
///
/// # Example
///
/// ```ignore
/// use attendance_api::attendance::{AttendanceService, Student};
/// use attendance_api::store::SqliteDatabase;
///
/// let service = AttendanceService::new(SqliteDatabase::open_in_memory()?);
/// service.register_student(&Student::new("S1", "Ann", "10A", "QR1")).await?;
///
/// let stats = service.statistics("2024-01-01").await?;
/// assert_eq!(stats.total_students, 1);
/// ```
pub struct AttendanceService<D: Database> {
    db: D,
}

impl<D: Database> AttendanceService<D> {
    /// Create a service over the given store.
    pub fn new(db: D) -> Self {
        Self { db }
    }

    /// Access the underlying store.
    pub fn database(&self) -> &D {
        &self.db
    }

    /// Insert a student. A duplicate id is reported as `AlreadyRegistered`, not an error.
    pub async fn register_student(
        &self,
        student: &Student,
    ) -> Result<Registration, AttendanceError> {
        let params = [
            Param::from(student.student_id.as_str()),
            Param::from(student.student_name.as_str()),
            Param::from(student.class_name.as_str()),
            Param::from(student.qr_code.as_str()),
        ];

        match self.db.execute(INSERT_STUDENT, &params).await {
            Ok(_) => Ok(Registration::Registered),
            Err(StoreError::Conflict(detail)) => {
                debug!(
                    "Student {} already registered ({})",
                    student.student_id, detail
                );
                Ok(Registration::AlreadyRegistered)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Insert an attendance record. At most one record exists per student and date.
    pub async fn mark(&self, record: &AttendanceRecord) -> Result<(), AttendanceError> {
        let params = [
            Param::from(record.student_id.as_str()),
            Param::from(record.student_name.as_str()),
            Param::from(record.class_name.as_str()),
            Param::from(record.attendance_date.as_str()),
            Param::from(record.attendance_time.as_str()),
            Param::from(record.status.as_str()),
        ];

        match self.db.execute(INSERT_ATTENDANCE, &params).await {
            Ok(_) => Ok(()),
            Err(StoreError::Conflict(_)) => Err(AttendanceError::AlreadyMarked),
            Err(e) => Err(e.into()),
        }
    }

    /// List student rows ordered by name, optionally restricted to one class.
    ///
    /// `None`, an empty string and `"all"` return every student. Rows are
    /// returned as stored, with every column.
    pub async fn list_students(&self, class: Option<&str>) -> Result<Vec<Row>, AttendanceError> {
        let rows = match class_filter(class) {
            Some(class) => {
                self.db
                    .fetch_all(SELECT_STUDENTS_BY_CLASS, &[Param::from(class)])
                    .await?
            }
            None => self.db.fetch_all(SELECT_STUDENTS, &[]).await?,
        };
        Ok(rows)
    }

    /// List the record rows for a date, latest time first, as stored.
    pub async fn attendance_for_date(&self, date: &str) -> Result<Vec<Row>, AttendanceError> {
        let rows = self
            .db
            .fetch_all(SELECT_ATTENDANCE_BY_DATE, &[Param::from(date)])
            .await?;
        Ok(rows)
    }

    /// Compute the statistics for a date.
    ///
    /// Only records with status `present` count towards `present_students`.
    pub async fn statistics(&self, date: &str) -> Result<AttendanceStatistics, AttendanceError> {
        let total = self.db.fetch_one(COUNT_STUDENTS, &[]).await?;
        let present = self
            .db
            .fetch_one(
                COUNT_PRESENT,
                &[
                    Param::from(date),
                    Param::from(AttendanceStatus::Present.as_str()),
                ],
            )
            .await?;

        Ok(AttendanceStatistics::from_counts(
            count_of(total.as_ref()),
            count_of(present.as_ref()),
        ))
    }

    /// Delete a student and then all of their attendance records.
    ///
    /// The two deletes are independent statements; removing an unknown id is not an error.
    pub async fn remove_student(&self, student_id: &str) -> Result<(), AttendanceError> {
        let params = [Param::from(student_id)];
        let students = self.db.execute(DELETE_STUDENT, &params).await?;
        let records = self.db.execute(DELETE_STUDENT_ATTENDANCE, &params).await?;
        debug!(
            "Removed student {}: {} student row(s), {} attendance row(s)",
            student_id, students, records
        );
        Ok(())
    }
}

fn count_of(row: Option<&Row>) -> i64 {
    row.and_then(|r| r.get("count"))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}
