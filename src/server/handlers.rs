//! HTTP request handlers for the attendance API.
//!
//! # Endpoints
//!
//! - `POST /api/register_student` (also `POST /api/student_attendance`) - Register a student
//! - `POST /api/mark_attendance` - Mark a student present
//! - `POST /api/mark_absent` - Mark a student absent at the current time
//! - `GET /api/get_students` - List students, optionally by class
//! - `GET /api/get_attendance_records` - List records for a date
//! - `GET /api/get_statistics` - Daily totals and attendance rate
//! - `POST /api/remove_student` - Remove a student and their records
//! - `GET /api/student_attendance` - Health probe
//!
//! Every JSON response carries a boolean `success`; failures add `message`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, FromRequest, FromRequestParts, Query, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::{self, DeserializeOwned, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::attendance::{
    wall_clock_time, AttendanceRecord, AttendanceService, AttendanceStatistics, AttendanceStatus,
    Registration, Student,
};
use crate::error::{ApiError, AttendanceError};
use crate::store::{Database, Row};
use crate::sync::{SyncDispatcher, SyncRecord};

/// Message returned when a registration hits an existing student id.
pub const ALREADY_REGISTERED: &str = "Student already registered";

/// Message returned by the health probe.
pub const HEALTH_MESSAGE: &str = "Student attendance API is working";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State extractor.
///
/// A missing service means no store is bound; API requests are then refused
/// before any handler runs.
pub struct AppState<D: Database> {
    /// The attendance service, if a store is configured
    pub service: Option<Arc<AttendanceService<D>>>,

    /// Best-effort spreadsheet sync, if configured
    pub sync: Option<SyncDispatcher>,
}

impl<D: Database> AppState<D> {
    /// Create state over a bound store.
    pub fn new(service: AttendanceService<D>) -> Self {
        Self {
            service: Some(Arc::new(service)),
            sync: None,
        }
    }

    /// Create state with no store bound.
    pub fn unbound() -> Self {
        Self {
            service: None,
            sync: None,
        }
    }

    /// Enable spreadsheet sync after successful writes.
    pub fn with_sync(mut self, sync: SyncDispatcher) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Whether a store is bound.
    pub fn is_bound(&self) -> bool {
        self.service.is_some()
    }

    fn service(&self) -> Result<&AttendanceService<D>, ApiError> {
        self.service.as_deref().ok_or(ApiError::DatabaseNotBound)
    }

    fn notify(&self, record: SyncRecord) {
        if let Some(ref sync) = self.sync {
            sync.dispatch(record);
        }
    }
}

impl<D: Database> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            sync: self.sync.clone(),
        }
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// JSON request body.
///
/// Unlike `axum::Json` this does not require a JSON content type, and any
/// read or parse failure becomes a 500 with the parser's message.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidBody(e.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }
}

/// Query string parameters with rejections mapped onto [`ApiError`].
///
/// A repeated key keeps its first value.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;

        let mut fields = Map::new();
        for (key, value) in pairs {
            fields.entry(key).or_insert(Value::String(value));
        }

        serde_json::from_value(Value::Object(fields))
            .map(QueryParams)
            .map_err(|e| ApiError::InvalidQuery(e.to_string()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

// =============================================================================
// Request Bodies and Query Parameters
// =============================================================================

/// Body of a registration request.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterStudentBody {
    #[serde(default, deserialize_with = "scalar_string")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub student_name: Option<String>,
    #[serde(default, rename = "class", deserialize_with = "scalar_string")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub qr_code: Option<String>,
}

impl RegisterStudentBody {
    /// Validate that every field is present and non-empty.
    pub fn into_student(self) -> Result<Student, AttendanceError> {
        Ok(Student::new(
            required(self.student_id)?,
            required(self.student_name)?,
            required(self.class_name)?,
            required(self.qr_code)?,
        ))
    }
}

/// Body of a mark-present request.
#[derive(Debug, Default, Deserialize)]
pub struct MarkAttendanceBody {
    #[serde(default, deserialize_with = "scalar_string")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub student_name: Option<String>,
    #[serde(default, rename = "class", deserialize_with = "scalar_string")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub attendance_date: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub attendance_time: Option<String>,
}

impl MarkAttendanceBody {
    /// Validate and build a `present` record.
    pub fn into_record(self) -> Result<AttendanceRecord, AttendanceError> {
        Ok(AttendanceRecord::new(
            required(self.student_id)?,
            required(self.student_name)?,
            required(self.class_name)?,
            required(self.attendance_date)?,
            required(self.attendance_time)?,
            AttendanceStatus::Present,
        ))
    }
}

/// Body of a mark-absent request. The time is taken from the server clock.
#[derive(Debug, Default, Deserialize)]
pub struct MarkAbsentBody {
    #[serde(default, deserialize_with = "scalar_string")]
    pub student_id: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub student_name: Option<String>,
    #[serde(default, rename = "class", deserialize_with = "scalar_string")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub attendance_date: Option<String>,
}

impl MarkAbsentBody {
    /// Validate and build an `absent` record stamped with `attendance_time`.
    pub fn into_record(self, attendance_time: String) -> Result<AttendanceRecord, AttendanceError> {
        Ok(AttendanceRecord::new(
            required(self.student_id)?,
            required(self.student_name)?,
            required(self.class_name)?,
            required(self.attendance_date)?,
            attendance_time,
            AttendanceStatus::Absent,
        ))
    }
}

/// Body of a removal request.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveStudentBody {
    #[serde(default, deserialize_with = "scalar_string")]
    pub student_id: Option<String>,
}

/// Query parameters for the student list.
#[derive(Debug, Default, Deserialize)]
pub struct StudentsQueryParams {
    /// Class to filter by; absent or `all` lists everyone
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
}

/// Query parameters for date-scoped endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DateQueryParams {
    #[serde(default)]
    pub date: Option<String>,
}

impl DateQueryParams {
    /// The requested date, rejecting absent or empty values.
    pub fn required_date(self) -> Result<String, AttendanceError> {
        self.date
            .filter(|d| !d.is_empty())
            .ok_or(AttendanceError::MissingDate)
    }
}

/// Accept a JSON string, number or boolean as text; `null` is absent.
fn scalar_string<'de, De>(deserializer: De) -> Result<Option<String>, De::Error>
where
    De: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::invalid_type(
            Unexpected::Other(json_kind(&other)),
            &"a string, number or boolean",
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        _ => "scalar",
    }
}

fn required(value: Option<String>) -> Result<String, AttendanceError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(AttendanceError::MissingFields)
}

// =============================================================================
// Response Types
// =============================================================================

/// Uniform JSON envelope for API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize = ()> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl ApiResponse<()> {
    /// `{success: true}`
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
            data: None,
        }
    }

    /// `{success: true, message}`
    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// `{success: false, message}`
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// `{success: true, data}`
    pub fn with_data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }
}

/// Health probe response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub methods: Vec<String>,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::DatabaseNotBound | ApiError::InvalidBody(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Attendance(err) => match err {
                AttendanceError::MissingFields
                | AttendanceError::MissingStudentId
                | AttendanceError::MissingDate
                | AttendanceError::AlreadyMarked => StatusCode::BAD_REQUEST,
                AttendanceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Convert ApiError to HTTP response.
///
/// - 4xx errors are logged at WARN level (client errors)
/// - 5xx errors are logged at ERROR level (server errors)
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = %status.as_u16(), "API error: {}", message);
        } else {
            warn!(status = %status.as_u16(), "API request rejected: {}", message);
        }

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

// =============================================================================
// Middleware
// =============================================================================

/// Refuse API requests with 500 when no store is bound.
pub async fn require_database<D: Database + 'static>(
    State(state): State<AppState<D>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.is_bound() {
        return Err(ApiError::DatabaseNotBound);
    }
    Ok(next.run(request).await)
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a student.
///
/// # Endpoint
///
/// `POST /api/register_student` or `POST /api/student_attendance`
///
/// # Request Body
///
/// ```json
/// { "student_id": "S1", "student_name": "Ann", "class": "10A", "qr_code": "QR1" }
/// ```
///
/// # Response
///
/// `200 OK` with `{"success": true}`, or
/// `{"success": true, "message": "Student already registered"}` when the id exists.
///
/// # Errors
///
/// - `400 Bad Request`: A field is missing or empty
/// - `500 Internal Server Error`: Malformed JSON or store failure
pub async fn register_student_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    JsonBody(body): JsonBody<RegisterStudentBody>,
) -> Result<Json<ApiResponse>, ApiError> {
    let service = state.service()?;
    let student = body.into_student()?;

    match service.register_student(&student).await? {
        Registration::Registered => {
            state.notify(SyncRecord::Student(student));
            Ok(Json(ApiResponse::ok()))
        }
        Registration::AlreadyRegistered => Ok(Json(ApiResponse::ok_with_message(ALREADY_REGISTERED))),
    }
}

/// Mark a student present.
///
/// # Endpoint
///
/// `POST /api/mark_attendance`
///
/// # Request Body
///
/// `student_id`, `student_name`, `class`, `attendance_date`, `attendance_time`
///
/// # Errors
///
/// - `400 Bad Request`: A field is missing, or attendance is already marked for that date
/// - `500 Internal Server Error`: Malformed JSON or store failure
pub async fn mark_attendance_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    JsonBody(body): JsonBody<MarkAttendanceBody>,
) -> Result<Json<ApiResponse>, ApiError> {
    let service = state.service()?;
    let record = body.into_record()?;

    service.mark(&record).await?;
    state.notify(SyncRecord::Attendance(record));

    Ok(Json(ApiResponse::ok()))
}

/// Mark a student absent, stamped with the server's current time.
///
/// # Endpoint
///
/// `POST /api/mark_absent`
///
/// # Request Body
///
/// `student_id`, `student_name`, `class`, `attendance_date`
///
/// # Errors
///
/// Same as [`mark_attendance_handler`].
pub async fn mark_absent_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    JsonBody(body): JsonBody<MarkAbsentBody>,
) -> Result<Json<ApiResponse>, ApiError> {
    let service = state.service()?;
    let record = body.into_record(wall_clock_time())?;

    service.mark(&record).await?;
    state.notify(SyncRecord::Attendance(record));

    Ok(Json(ApiResponse::ok()))
}

/// List students ordered by name.
///
/// # Endpoint
///
/// `GET /api/get_students?class=<optional>`
///
/// `class=all` or no `class` lists every student. Rows carry every stored column.
pub async fn list_students_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    QueryParams(query): QueryParams<StudentsQueryParams>,
) -> Result<Json<ApiResponse<Vec<Row>>>, ApiError> {
    let students = state
        .service()?
        .list_students(query.class_name.as_deref())
        .await?;
    Ok(Json(ApiResponse::with_data(students)))
}

/// List attendance records for a date, latest time first.
///
/// # Endpoint
///
/// `GET /api/get_attendance_records?date=<required>`
///
/// # Errors
///
/// - `400 Bad Request`: `date` is missing (the store is not queried)
pub async fn attendance_records_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    QueryParams(query): QueryParams<DateQueryParams>,
) -> Result<Json<ApiResponse<Vec<Row>>>, ApiError> {
    let date = query.required_date()?;
    let records = state.service()?.attendance_for_date(&date).await?;
    Ok(Json(ApiResponse::with_data(records)))
}

/// Daily statistics.
///
/// # Endpoint
///
/// `GET /api/get_statistics?date=<required>`
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "total_students": 4,
///     "present_students": 3,
///     "absent_students": 1,
///     "attendance_rate": 75
///   }
/// }
/// ```
pub async fn statistics_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    QueryParams(query): QueryParams<DateQueryParams>,
) -> Result<Json<ApiResponse<AttendanceStatistics>>, ApiError> {
    let date = query.required_date()?;
    let stats = state.service()?.statistics(&date).await?;
    Ok(Json(ApiResponse::with_data(stats)))
}

/// Remove a student and all of their attendance records.
///
/// # Endpoint
///
/// `POST /api/remove_student` with body `{"student_id": "S1"}`
///
/// # Errors
///
/// - `400 Bad Request`: `student_id` is missing
pub async fn remove_student_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    JsonBody(body): JsonBody<RemoveStudentBody>,
) -> Result<Json<ApiResponse>, ApiError> {
    let service = state.service()?;
    let student_id = body
        .student_id
        .filter(|id| !id.is_empty())
        .ok_or(AttendanceError::MissingStudentId)?;

    service.remove_student(&student_id).await?;
    Ok(Json(ApiResponse::ok()))
}

/// Health probe: confirms the API is reachable without touching the store.
///
/// # Endpoint
///
/// `GET /api/student_attendance`
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: HEALTH_MESSAGE.to_string(),
        methods: vec!["GET".to_string(), "POST".to_string()],
    })
}

/// Fallback for unmatched paths and methods under the API prefix.
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

// =============================================================================
// Tests
// =============================================================================
