//! Decision-tree model artifact.
//!
//! The trained tree is exported as JSON:
//!
//! ```json
//! {
//!   "name": "cleaning-tree-v1",
//!   "nodes": [
//!     { "feature": 1, "threshold": 17.5, "left": 1, "right": 2 },
//!     { "label": 1 },
//!     { "label": 0 }
//!   ]
//! }
//! ```
//!
//! Node 0 is the root. A split sends the sample left when
//! `x[feature] <= threshold`, matching CART-style exports.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{Classifier, ModelError};
use crate::types::{FeatureVector, FEATURE_COUNT};

/// A single tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        label: i64,
    },
}

/// On-disk artifact layout, unchecked.
#[derive(Debug, Deserialize)]
struct TreeArtifact {
    #[serde(default = "default_name")]
    name: String,
    nodes: Vec<TreeNode>,
}

/// Validated binary decision tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTree {
    name: String,
    nodes: Vec<TreeNode>,
}

fn default_name() -> String {
    "decision-tree".to_string()
}

impl DecisionTree {
    /// Build a tree from nodes, checking it is well-formed.
    pub fn new(name: impl Into<String>, nodes: Vec<TreeNode>) -> Result<Self, ModelError> {
        let tree = Self {
            name: name.into(),
            nodes,
        };
        tree.check()?;
        Ok(tree)
    }

    /// Parse and validate a JSON artifact.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: TreeArtifact = serde_json::from_slice(bytes)?;
        Self::new(artifact.name, artifact.nodes)
    }

    /// Read, parse and validate an artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&bytes)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural checks. Children must come after their parent, which rules
    /// out cycles and guarantees every walk reaches a leaf.
    fn check(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::Invalid("tree has no nodes".to_string()));
        }

        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(ModelError::Invalid(format!(
                        "node {idx}: feature index {feature} out of range (expected < {FEATURE_COUNT})"
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ModelError::Invalid(format!(
                        "node {idx}: threshold is not finite"
                    )));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= len {
                        return Err(ModelError::Invalid(format!(
                            "node {idx}: child index {child} must be in ({idx}, {len})"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk the tree from the root to a leaf.
    pub fn walk(&self, features: &FeatureVector) -> i64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { label } => return *label,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        if features.iter().any(|f| !f.is_finite()) {
            return Err(ModelError::Inference(
                "feature vector contains non-finite values".to_string(),
            ));
        }
        Ok(self.walk(features))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
