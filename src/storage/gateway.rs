//! Persistence Gateway
//!
//! Sole owner of the record store. Appends one record per successful
//! ingestion and serves bounded, most-recent-first read-back.

use std::sync::Arc;

use super::persistence::{RecordStore, StorageError};
use crate::config::defaults::{RECENT_LIMIT_MAX, RECENT_LIMIT_MIN};
use crate::types::{NewRecord, Record, RecordId};

/// Clamp a caller-supplied limit into `[RECENT_LIMIT_MIN, RECENT_LIMIT_MAX]`.
pub fn clamp_limit(limit: i64) -> usize {
    let clamped = limit.clamp(RECENT_LIMIT_MIN as i64, RECENT_LIMIT_MAX as i64);
    usize::try_from(clamped).unwrap_or(RECENT_LIMIT_MIN)
}

#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn RecordStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Append one record. No retry; the caller decides what a failure means.
    pub fn append(&self, record: NewRecord) -> Result<RecordId, StorageError> {
        self.store.append(record)
    }

    /// Most recent records first. `limit` is clamped, never rejected.
    pub fn recent(&self, limit: i64) -> Result<Vec<Record>, StorageError> {
        self.store.recent(clamp_limit(limit))
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        self.store.count()
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::types::{Prediction, Reading};
    use chrono::Utc;

    fn gateway_with(n: usize) -> PersistenceGateway {
        let gateway = PersistenceGateway::new(Arc::new(InMemoryStore::new()));
        for i in 0..n {
            gateway
                .append(NewRecord {
                    reading: Reading::new(i as f64, 10.0, 0, Utc::now()),
                    prediction: Prediction::Label(1),
                })
                .unwrap();
        }
        gateway
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(-5), 1);
        assert_eq!(clamp_limit(i64::MIN), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(100), 100);
        assert_eq!(clamp_limit(101), 100);
        assert_eq!(clamp_limit(i64::MAX), 100);
    }

    #[test]
    fn test_recent_clamps_low_limits_to_one() {
        let gateway = gateway_with(5);
        assert_eq!(gateway.recent(0).unwrap().len(), 1);
        assert_eq!(gateway.recent(-3).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_caps_at_hundred() {
        let gateway = gateway_with(120);
        let records = gateway.recent(500).unwrap();
        assert_eq!(records.len(), 100);
        assert!(records.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[test]
    fn test_empty_store_returns_empty() {
        let gateway = gateway_with(0);
        assert!(gateway.recent(10).unwrap().is_empty());
    }
}
