use thiserror::Error;

/// Errors reported by the relational store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A uniqueness or primary key constraint rejected the statement
    #[error("{0}")]
    Conflict(String),

    /// The statement failed for any other reason (raw engine message)
    #[error("{0}")]
    Query(String),

    /// A row could not be decoded into the expected record type
    #[error("Failed to decode row: {0}")]
    Decode(String),

    /// The connection could not be opened or is no longer usable
    #[error("Database connection error: {0}")]
    Connection(String),
}

impl StoreError {
    /// Whether this error is a constraint conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Domain-level outcomes of attendance operations that are not successes.
///
/// Validation and conflict variants map to 400 responses; `Store` is the
/// catch-all that surfaces as a 500 with the raw store message.
#[derive(Debug, Clone, Error)]
pub enum AttendanceError {
    /// One or more required body fields are absent or empty
    #[error("Missing required fields")]
    MissingFields,

    /// Removal was requested without a student id
    #[error("student_id is required")]
    MissingStudentId,

    /// A date-scoped query was made without the `date` parameter
    #[error("Date parameter is required")]
    MissingDate,

    /// A record already exists for this student and date
    #[error("Attendance already marked for today")]
    AlreadyMarked,

    /// Any other store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced by the HTTP layer.
///
/// Every variant maps to a status code and a `{success:false, message}` body.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No store is configured for this server
    #[error("Database not bound")]
    DatabaseNotBound,

    /// No operation matches the path and method
    #[error("API endpoint not found")]
    NotFound,

    /// The request body could not be read or parsed as JSON
    #[error("{0}")]
    InvalidBody(String),

    /// The query string could not be decoded
    #[error("{0}")]
    InvalidQuery(String),

    /// Outcome of the attendance operation itself
    #[error(transparent)]
    Attendance(#[from] AttendanceError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Attendance(AttendanceError::Store(err))
    }
}

/// Errors from the spreadsheet sync side effect.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// The HTTP request could not be sent or completed
    #[error("Sheets request failed: {0}")]
    Request(String),

    /// The Sheets API answered with a non-success status
    #[error("Sheets API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The sync client was built from an unusable configuration
    #[error("Invalid sync configuration: {0}")]
    Configuration(String),
}
