//! Best-effort spreadsheet sync.
//!
//! After a student is registered or attendance is marked, a [`SyncRecord`] is
//! handed to the [`SyncDispatcher`], which appends it to an external sheet on a
//! detached task. The primary request never waits on it and never sees its
//! failure; errors are only logged.

mod google;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::attendance::{AttendanceRecord, Student};
use crate::error::SyncError;

pub use google::{GoogleSheetsSync, DEFAULT_SHEETS_ENDPOINT};

/// A row destined for an external sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncRecord {
    Student(Student),
    Attendance(AttendanceRecord),
}

impl SyncRecord {
    /// Name of the sheet (tab) the row is appended to.
    pub fn sheet(&self) -> &'static str {
        match self {
            SyncRecord::Student(_) => "students",
            SyncRecord::Attendance(_) => "attendance",
        }
    }

    /// Cell values for the appended row.
    ///
    /// Student rows end with the UTC time of the sync; attendance rows carry
    /// the marked date and time.
    pub fn row(&self) -> Vec<String> {
        match self {
            SyncRecord::Student(s) => vec![
                s.student_id.clone(),
                s.student_name.clone(),
                s.class_name.clone(),
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ],
            SyncRecord::Attendance(r) => vec![
                r.student_id.clone(),
                r.student_name.clone(),
                r.class_name.clone(),
                r.attendance_date.clone(),
                r.attendance_time.clone(),
            ],
        }
    }
}

/// Destination that can append rows to a spreadsheet.
#[async_trait]
pub trait SheetSync: Send + Sync {
    /// Append one row for the record.
    async fn append(&self, record: &SyncRecord) -> Result<(), SyncError>;
}

/// Fire-and-forget dispatcher for sync records.
#[derive(Clone)]
pub struct SyncDispatcher {
    sink: Arc<dyn SheetSync>,
}

impl SyncDispatcher {
    /// Create a dispatcher over the given sink.
    pub fn new(sink: impl SheetSync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Create a dispatcher over a shared sink.
    pub fn from_shared(sink: Arc<dyn SheetSync>) -> Self {
        Self { sink }
    }

    /// Spawn the append on a detached task.
    ///
    /// The returned handle may be dropped; failures are logged and discarded.
    pub fn dispatch(&self, record: SyncRecord) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            match sink.append(&record).await {
                Ok(()) => debug!("Synced row to sheet '{}'", record.sheet()),
                Err(e) => warn!("Sheet sync to '{}' failed: {}", record.sheet(), e),
            }
        })
    }
}
