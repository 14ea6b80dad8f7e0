//! Cleaning coordination endpoints

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::envelope::{ApiErrorResponse, ApiResponse};

use super::HubState;

/// Request body for POST /api/v1/cleaning/request
#[derive(Debug, Deserialize)]
pub struct CleaningRequestBody {
    pub activate: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CleaningFlag {
    pub requested: bool,
}

#[derive(Debug, Serialize)]
pub struct CleaningAck {
    pub acknowledged: bool,
    pub requested: bool,
}

/// POST /api/v1/cleaning/request
///
/// `activate: false` is accepted but does not clear a pending request;
/// only the device acknowledgement does.
pub async fn request_cleaning(
    State(state): State<HubState>,
    body: Result<Json<CleaningRequestBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return ApiErrorResponse::bad_request(e.body_text()),
    };

    let requested = match body.activate {
        Some(true) => state.coordinator.request(),
        Some(false) => state.coordinator.query(),
        None => {
            return ApiErrorResponse::bad_request_field("missing required field 'activate'", "activate")
        }
    };

    ApiResponse::ok(CleaningFlag { requested })
}

/// GET /api/v1/cleaning
pub async fn get_cleaning(State(state): State<HubState>) -> Response {
    ApiResponse::ok(CleaningFlag {
        requested: state.coordinator.query(),
    })
}

/// POST /api/v1/cleaning/ack
pub async fn acknowledge_cleaning(State(state): State<HubState>) -> Response {
    let requested = state.coordinator.acknowledge();
    ApiResponse::ok(CleaningAck {
        acknowledged: true,
        requested,
    })
}
