//! RecordStore trait — pluggable storage backend
//!
//! Abstracts record persistence so backends can be swapped without touching
//! the ingestion pipeline:
//! - `SledRecordStore`: durable embedded store (default)
//! - `InMemoryStore`: tests and ephemeral deployments
//! - `DetachedStore`: stands in when the configured backend could not be
//!   opened; every call fails with `ConnectionFailed`

use crate::types::{NewRecord, Record, RecordId};

/// Trait for pluggable record backends.
///
/// Implementations must be thread-safe (Send + Sync) for shared access
/// across async tasks. Ids must be unique and increase with every
/// successful append.
pub trait RecordStore: Send + Sync {
    /// Append a record, returning its assigned id
    fn append(&self, record: NewRecord) -> Result<RecordId, StorageError>;

    /// Up to `limit` records, most recent first
    fn recent(&self, limit: usize) -> Result<Vec<Record>, StorageError>;

    /// Number of stored records
    fn count(&self) -> Result<usize, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("store unreachable: {0}")]
    ConnectionFailed(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Whether the backend could not be reached at all.
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_))
    }
}

/// In-memory record store.
///
/// Thread-safe via `RwLock`. Not durable — data lost on restart.
#[derive(Default)]
pub struct InMemoryStore {
    records: std::sync::RwLock<Vec<Record>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryStore {
    fn append(&self, record: NewRecord) -> Result<RecordId, StorageError> {
        let mut store = self
            .records
            .write()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        let id = store.last().map_or(1, |r| r.id + 1);
        store.push(Record::from_new(id, record));
        Ok(id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<Record>, StorageError> {
        let store = self
            .records
            .read()
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?;

        Ok(store.iter().rev().take(limit).copied().collect())
    }

    fn count(&self) -> Result<usize, StorageError> {
        self.records
            .read()
            .map(|s| s.len())
            .map_err(|e| StorageError::ReadFailed(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

/// Placeholder store for a backend that failed to open.
pub struct DetachedStore {
    reason: String,
}

impl DetachedStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl RecordStore for DetachedStore {
    fn append(&self, _record: NewRecord) -> Result<RecordId, StorageError> {
        Err(StorageError::ConnectionFailed(self.reason.clone()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<Record>, StorageError> {
        Err(StorageError::ConnectionFailed(self.reason.clone()))
    }

    fn count(&self) -> Result<usize, StorageError> {
        Err(StorageError::ConnectionFailed(self.reason.clone()))
    }

    fn backend_name(&self) -> &'static str {
        "Detached"
    }
}
