//! Classifier Adapter
//!
//! Wraps the trained cleaning-necessity model behind a holder that is either
//! `Loaded` or `Unavailable`. Classification never fails: an unavailable
//! model, or an inference error, yields [`Prediction::Unavailable`] so that
//! ingestion keeps capturing data.
//!
//! The holder is an `ArcSwap`, so reloads replace the model atomically while
//! in-flight inferences keep using the snapshot they started with.

mod tree;
pub mod watcher;

pub use tree::{DecisionTree, TreeNode};

use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::types::{FeatureVector, Prediction, Reading};

/// Errors raised while loading or running a model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("cannot read model artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    Invalid(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// A trained model mapping the fixed-order feature vector to a label.
///
/// Implementations must be pure: no interior mutation, safe to call from
/// many tasks at once.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError>;

    /// Model identifier for logs and health output
    fn name(&self) -> &str;
}

/// Current model slot.
#[derive(Clone)]
pub enum ModelState {
    Loaded {
        model: Arc<dyn Classifier>,
        source: String,
    },
    Unavailable {
        reason: String,
    },
}

impl ModelState {
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded { model, source } => f
                .debug_struct("Loaded")
                .field("model", &model.name())
                .field("source", source)
                .finish(),
            Self::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Shared, hot-swappable classifier.
pub struct ClassifierAdapter {
    state: ArcSwap<ModelState>,
}

impl ClassifierAdapter {
    /// Holder with a model already in place.
    pub fn loaded(model: Arc<dyn Classifier>, source: impl Into<String>) -> Self {
        Self {
            state: ArcSwap::from_pointee(ModelState::Loaded {
                model,
                source: source.into(),
            }),
        }
    }

    /// Holder in degraded mode.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: ArcSwap::from_pointee(ModelState::Unavailable {
                reason: reason.into(),
            }),
        }
    }

    /// Load a decision-tree artifact at startup.
    ///
    /// A missing or broken artifact is logged and produces an unavailable
    /// holder; the service still starts.
    pub fn from_artifact(path: &Path) -> Self {
        match DecisionTree::load(path) {
            Ok(tree) => {
                tracing::info!(
                    path = %path.display(),
                    model = %Classifier::name(&tree),
                    nodes = tree.node_count(),
                    "Classifier loaded"
                );
                Self::loaded(Arc::new(tree), path.display().to_string())
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Classifier unavailable, predictions will be null"
                );
                Self::unavailable(e.to_string())
            }
        }
    }

    /// Snapshot of the current slot.
    pub fn state(&self) -> Arc<ModelState> {
        self.state.load_full()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.load().is_loaded()
    }

    /// Classify a reading. Never fails.
    pub fn classify(&self, reading: &Reading) -> Prediction {
        let features = reading.features();
        match &**self.state.load() {
            ModelState::Loaded { model, .. } => match model.predict(&features) {
                Ok(label) => Prediction::Label(label),
                Err(e) => {
                    tracing::warn!(model = %model.name(), error = %e, "Inference failed, returning null prediction");
                    Prediction::Unavailable
                }
            },
            ModelState::Unavailable { .. } => Prediction::Unavailable,
        }
    }

    /// Replace the model.
    pub fn swap(&self, model: Arc<dyn Classifier>, source: impl Into<String>) {
        let source = source.into();
        tracing::info!(model = %model.name(), source = %source, "Classifier swapped");
        self.state.store(Arc::new(ModelState::Loaded { model, source }));
    }

    /// Reload a decision-tree artifact.
    ///
    /// On failure a previously loaded model stays active; a holder that had
    /// no model records the new failure reason.
    pub fn reload_from(&self, path: &Path) -> Result<(), ModelError> {
        match DecisionTree::load(path) {
            Ok(tree) => {
                self.swap(Arc::new(tree), path.display().to_string());
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                self.state.rcu(|current| match &**current {
                    ModelState::Loaded { .. } => Arc::clone(current),
                    ModelState::Unavailable { .. } => Arc::new(ModelState::Unavailable {
                        reason: reason.clone(),
                    }),
                });
                Err(e)
            }
        }
    }
}
