//! System health endpoint

use axum::extract::State;
use axum::response::Response;
use chrono::Utc;
use serde::Serialize;

use crate::api::envelope::ApiResponse;
use crate::cleaning::CleaningStatus;
use crate::pipeline::IngestStatsSnapshot;

use super::{ClassifierInfo, HubState};

#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub backend: &'static str,
    /// Stored record count, absent when the store cannot be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    /// "ok", or "degraded" when the model or store is unavailable
    pub status: &'static str,
    pub uptime_seconds: i64,
    pub classifier: ClassifierInfo,
    pub storage: StorageHealth,
    pub cleaning: CleaningStatus,
    pub ingest: IngestStatsSnapshot,
}

/// GET /api/v1/system/health
pub async fn system_health(State(state): State<HubState>) -> Response {
    let classifier_state = state.pipeline.classifier().state();
    let gateway = state.pipeline.gateway();

    let storage = match gateway.count() {
        Ok(n) => StorageHealth {
            backend: gateway.backend_name(),
            records: Some(n),
            error: None,
        },
        Err(e) => StorageHealth {
            backend: gateway.backend_name(),
            records: None,
            error: Some(e.to_string()),
        },
    };

    let degraded = !classifier_state.is_loaded() || storage.error.is_some();

    ApiResponse::ok(SystemHealth {
        status: if degraded { "degraded" } else { "ok" },
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        classifier: ClassifierInfo::from(&*classifier_state),
        storage,
        cleaning: state.coordinator.status(),
        ingest: state.pipeline.stats(),
    })
}
