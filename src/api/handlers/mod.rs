//! API route handlers
//!
//! - Telemetry ingestion and record read-back
//! - Cleaning request / poll / acknowledge
//! - Classifier reload and system health

mod classifier;
mod cleaning;
mod readings;
mod system;

pub use classifier::*;
pub use cleaning::*;
pub use readings::*;
pub use system::*;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cleaning::CleaningCoordinator;
use crate::pipeline::IngestPipeline;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct HubState {
    /// Ingestion pipeline (owns the classifier and persistence gateway)
    pub pipeline: IngestPipeline,
    /// Cleaning request flag shared by operator and device
    pub coordinator: Arc<CleaningCoordinator>,
    /// Artifact reloaded by `POST /classifier/reload`
    pub model_path: Arc<PathBuf>,
    /// `limit` used when a read-back request omits it
    pub default_limit: usize,
    pub started_at: DateTime<Utc>,
}

impl HubState {
    pub fn new(
        pipeline: IngestPipeline,
        coordinator: Arc<CleaningCoordinator>,
        model_path: PathBuf,
        default_limit: usize,
    ) -> Self {
        Self {
            pipeline,
            coordinator,
            model_path: Arc::new(model_path),
            default_limit,
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::classifier::{Classifier, ClassifierAdapter, ModelError};
    use crate::pipeline::ReadingValidator;
    use crate::storage::{InMemoryStore, PersistenceGateway, RecordStore};
    use crate::types::FeatureVector;

    /// Flags cleaning when distance < 15.
    pub struct NearDistance;

    impl Classifier for NearDistance {
        fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
            Ok(i64::from(features[1] < 15.0))
        }
        fn name(&self) -> &str {
            "near-distance"
        }
    }

    pub fn state_with(store: Arc<dyn RecordStore>, classifier: ClassifierAdapter) -> HubState {
        let pipeline = IngestPipeline::new(
            ReadingValidator::default(),
            Arc::new(classifier),
            PersistenceGateway::new(store),
        );
        HubState::new(
            pipeline,
            Arc::new(CleaningCoordinator::new()),
            PathBuf::from("/nonexistent/model.json"),
            10,
        )
    }

    pub fn create_test_state() -> HubState {
        state_with(
            Arc::new(InMemoryStore::new()),
            ClassifierAdapter::loaded(Arc::new(NearDistance), "test"),
        )
    }
}
