//! Cross-origin headers for every response.
//!
//! The header set is a constant; the middleware stamps it onto each response
//! and answers `OPTIONS` preflights itself with an empty 204 so they never
//! reach routing or handlers.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// Origins allowed to call the API.
pub const ALLOW_ORIGIN: &str = "*";

/// Methods advertised to browsers.
pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// Request headers browsers may send.
pub const ALLOW_HEADERS: &str = "Content-Type";

/// The CORS header set attached to every response.
pub fn cors_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ),
        (
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ),
        (
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ),
    ]
}

/// Insert the CORS headers, replacing any existing values.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    for (name, value) in cors_headers() {
        headers.insert(name, value);
    }
}

/// Axum middleware that short-circuits preflights and decorates responses.
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, Router};
/// use attendance_api::server::cors::cors_middleware;
///
/// let app = Router::new()
///     .route("/api/get_students", get(list_students))
///     .layer(middleware::from_fn(cors_middleware));
/// ```
pub async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}
