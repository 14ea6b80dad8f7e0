//! Telemetry readings as accepted from the litter-box sensor unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of features the classifier consumes.
pub const FEATURE_COUNT: usize = 3;

/// Fixed-order feature vector: `[weight, distance, cleanlinessFlag]`.
pub type FeatureVector = [f64; FEATURE_COUNT];

/// One validated telemetry sample.
///
/// Built only by the reading validator; the timestamp is assigned at
/// ingestion time, never taken from the device payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Weight on the scale (kg as reported by the load cell)
    pub weight: f64,

    /// Ultrasonic distance to the litter surface (cm)
    pub distance: f64,

    /// Cleanliness/state flag reported by the device (0 or 1 in practice)
    pub cleanliness_flag: i64,

    /// When the hub accepted the reading
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(weight: f64, distance: f64, cleanliness_flag: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            weight,
            distance,
            cleanliness_flag,
            timestamp,
        }
    }

    /// Feature vector in the order the model was trained on.
    #[allow(clippy::cast_precision_loss)]
    pub fn features(&self) -> FeatureVector {
        [self.weight, self.distance, self.cleanliness_flag as f64]
    }
}
