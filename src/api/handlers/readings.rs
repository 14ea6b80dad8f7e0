//! Telemetry endpoints: ingest and recent records

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::types::Record;

use super::HubState;

// ============================================================================
// Ingest
// ============================================================================

/// POST /api/v1/readings (and legacy POST /api/datos)
///
/// The body is parsed as JSON whatever the `Content-Type`; the firmware
/// does not always send one.
pub async fn ingest_reading(State(state): State<HubState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return ApiErrorResponse::bad_request(format!("malformed JSON body: {e}")),
    };

    match state.pipeline.ingest(&payload) {
        Ok(outcome) => ApiResponse::created(outcome.result),
        Err(e) => ApiErrorResponse::from_ingest(&e),
    }
}

// ============================================================================
// Recent records
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// Raw text so out-of-range integers can be clamped instead of rejected
    pub limit: Option<String>,
}

/// Parse a `limit` query value, saturating integers that overflow `i64`.
///
/// Returns `None` only for text that is not an integer.
fn parse_limit(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

/// Records page, most recent first
#[derive(Debug, Serialize)]
pub struct RecordsPage {
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// GET /api/v1/readings?limit=N
pub async fn get_recent_readings(
    State(state): State<HubState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Response {
    let Query(q) = match query {
        Ok(q) => q,
        Err(e) => return ApiErrorResponse::bad_request_field(e.body_text(), "limit"),
    };

    let limit = match q.limit.as_deref() {
        Some(raw) => match parse_limit(raw) {
            Some(n) => n,
            None => {
                return ApiErrorResponse::bad_request_field(
                    format!("limit must be an integer, got {raw:?}"),
                    "limit",
                )
            }
        },
        None => i64::try_from(state.default_limit).unwrap_or(i64::MAX),
    };

    match state.pipeline.gateway().recent(limit) {
        Ok(records) => {
            let message = records.is_empty().then_some("no records");
            ApiResponse::ok(RecordsPage { records, message })
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read recent records");
            ApiErrorResponse::from_storage(&e)
        }
    }
}
