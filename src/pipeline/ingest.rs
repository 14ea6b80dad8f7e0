//! Ingestion Pipeline
//!
//! validate -> classify -> persist -> respond.
//!
//! Only malformed input fails a call. A missing model degrades the
//! prediction to null and an unreachable store is logged and skipped, so the
//! device never has to retry a delivery.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::validator::{ReadingValidator, ValidationError};
use crate::classifier::ClassifierAdapter;
use crate::storage::PersistenceGateway;
use crate::types::{NewRecord, Prediction, Reading, RecordId};

/// Ingestion failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

/// Response body of a successful ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub weight: f64,
    pub distance: f64,
    pub cleanliness_flag: i64,
    pub prediction: Prediction,
}

/// Result plus the storage bookkeeping that stays server-side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestOutcome {
    pub result: IngestResult,
    /// Assigned id, `None` when the record was not durably stored
    pub record_id: Option<RecordId>,
}

impl IngestOutcome {
    pub const fn stored(&self) -> bool {
        self.record_id.is_some()
    }
}

/// Process-wide ingestion counters.
#[derive(Debug, Default)]
pub struct IngestStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    stored: AtomicU64,
    unstored: AtomicU64,
    degraded: AtomicU64,
}

/// Point-in-time copy of [`IngestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStatsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub stored: u64,
    pub unstored: u64,
    pub degraded: u64,
}

impl IngestStats {
    pub fn snapshot(&self) -> IngestStatsSnapshot {
        IngestStatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            unstored: self.unstored.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone)]
pub struct IngestPipeline {
    validator: Arc<ReadingValidator>,
    classifier: Arc<ClassifierAdapter>,
    gateway: PersistenceGateway,
    stats: Arc<IngestStats>,
}

impl IngestPipeline {
    pub fn new(
        validator: ReadingValidator,
        classifier: Arc<ClassifierAdapter>,
        gateway: PersistenceGateway,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            classifier,
            gateway,
            stats: Arc::new(IngestStats::default()),
        }
    }

    /// Ingest one telemetry payload.
    pub fn ingest(&self, payload: &Value) -> Result<IngestOutcome, IngestError> {
        let reading = match self.validator.validate(payload) {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(error = %e, "Rejected telemetry payload");
                return Err(e.into());
            }
        };
        self.stats.accepted.fetch_add(1, Ordering::Relaxed);

        let prediction = self.classifier.classify(&reading);
        if !prediction.is_available() {
            self.stats.degraded.fetch_add(1, Ordering::Relaxed);
        }

        let record_id = self.persist(reading, prediction);

        Ok(IngestOutcome {
            result: IngestResult {
                weight: reading.weight,
                distance: reading.distance,
                cleanliness_flag: reading.cleanliness_flag,
                prediction,
            },
            record_id,
        })
    }

    /// Single write attempt. Failures are logged, never retried.
    fn persist(&self, reading: Reading, prediction: Prediction) -> Option<RecordId> {
        match self.gateway.append(NewRecord {
            reading,
            prediction,
        }) {
            Ok(id) => {
                self.stats.stored.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    record_id = id,
                    needs_cleaning = prediction.needs_cleaning(),
                    "Reading ingested"
                );
                Some(id)
            }
            Err(e) => {
                self.stats.unstored.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    error = %e,
                    weight = reading.weight,
                    distance = reading.distance,
                    cleanliness_flag = reading.cleanliness_flag,
                    prediction = ?prediction.label(),
                    "Reading not persisted"
                );
                None
            }
        }
    }

    pub fn stats(&self) -> IngestStatsSnapshot {
        self.stats.snapshot()
    }

    pub const fn gateway(&self) -> &PersistenceGateway {
        &self.gateway
    }

    pub fn classifier(&self) -> &Arc<ClassifierAdapter> {
        &self.classifier
    }
}
