//! API middleware layers.
//!
//! Marks the legacy firmware route as deprecated in favour of
//! `/api/v1/readings`.

use axum::http::header::{HeaderName, LINK};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;

/// Adds RFC 8594 style deprecation headers to legacy responses.
///
/// - `Deprecation: true`
/// - `Link: </api/v1/readings>; rel="successor-version"`
pub async fn add_legacy_deprecation_headers(
    request: axum::extract::Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("deprecation"),
        HeaderValue::from_static("true"),
    );
    headers.insert(
        LINK,
        HeaderValue::from_static("</api/v1/readings>; rel=\"successor-version\""),
    );

    response
}
