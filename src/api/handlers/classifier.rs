//! Classifier management endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use serde::Serialize;

use crate::api::envelope::{ApiErrorResponse, ApiResponse};
use crate::classifier::ModelState;

use super::HubState;

/// Classifier slot as reported over the API.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ClassifierInfo {
    Loaded { model: String, source: String },
    Unavailable { reason: String },
}

impl From<&ModelState> for ClassifierInfo {
    fn from(state: &ModelState) -> Self {
        match state {
            ModelState::Loaded { model, source } => Self::Loaded {
                model: model.name().to_string(),
                source: source.clone(),
            },
            ModelState::Unavailable { reason } => Self::Unavailable {
                reason: reason.clone(),
            },
        }
    }
}

/// POST /api/v1/classifier/reload
///
/// Re-reads the configured artifact. On failure the active model is kept.
pub async fn reload_classifier(State(state): State<HubState>) -> Response {
    let classifier = Arc::clone(state.pipeline.classifier());
    let path = Arc::clone(&state.model_path);
    let reloaded = tokio::task::spawn_blocking(move || classifier.reload_from(&path)).await;

    match reloaded {
        Ok(Ok(())) => {
            ApiResponse::ok(ClassifierInfo::from(&*state.pipeline.classifier().state()))
        }
        Ok(Err(e)) => {
            tracing::error!(path = %state.model_path.display(), error = %e, "Manual classifier reload failed");
            ApiErrorResponse::internal(format!("reload failed: {e}"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Classifier reload task panicked");
            ApiErrorResponse::internal("reload task failed")
        }
    }
}
