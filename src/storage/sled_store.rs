//! Sled-backed record store
//!
//! Records live in the `records` tree. Keys are the record id as big-endian
//! bytes so iteration order is id order; reverse iteration gives the most
//! recent records first. Values are JSON.

use std::path::Path;

use sled::{Db, Tree};

use super::persistence::{RecordStore, StorageError};
use crate::config::defaults::RECORDS_TREE;
use crate::types::{NewRecord, Record, RecordId};

/// Durable record store
pub struct SledRecordStore {
    db: Db,
    tree: Tree,
    flush_on_write: bool,
}

impl SledRecordStore {
    /// Open or create the store at `path`
    pub fn open<P: AsRef<Path>>(path: P, flush_on_write: bool) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| {
            StorageError::ConnectionFailed(format!("cannot open {}: {e}", path.display()))
        })?;
        let store = Self::with_db(db, flush_on_write)?;
        tracing::info!(path = %path.display(), records = store.tree.len(), "Record store opened");
        Ok(store)
    }

    /// Open a throwaway store (for testing)
    pub fn open_temp() -> Result<Self, StorageError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        Self::with_db(db, false)
    }

    fn with_db(db: Db, flush_on_write: bool) -> Result<Self, StorageError> {
        let tree = db
            .open_tree(RECORDS_TREE)
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            db,
            tree,
            flush_on_write,
        })
    }
}

impl RecordStore for SledRecordStore {
    fn append(&self, record: NewRecord) -> Result<RecordId, StorageError> {
        // generate_id is unique and monotonic across restarts; shift so ids start at 1
        let id = self
            .db
            .generate_id()
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?
            + 1;

        let value = serde_json::to_vec(&Record::from_new(id, record))?;
        self.tree
            .insert(id.to_be_bytes(), value)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        if self.flush_on_write {
            self.tree
                .flush()
                .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        }

        tracing::debug!(record_id = id, "Stored record");
        Ok(id)
    }

    fn recent(&self, limit: usize) -> Result<Vec<Record>, StorageError> {
        let mut records = Vec::with_capacity(limit);

        for item in self.tree.iter().rev() {
            if records.len() >= limit {
                break;
            }

            let (key, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            match serde_json::from_slice::<Record>(&value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(key = ?key.as_ref(), error = %e, "Skipping corrupt record");
                }
            }
        }

        Ok(records)
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.tree.len())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Prediction, Reading};
    use chrono::Utc;

    fn make_record(weight: f64, prediction: Prediction) -> NewRecord {
        NewRecord {
            reading: Reading::new(weight, 12.0, 1, Utc::now()),
            prediction,
        }
    }

    #[test]
    fn test_append_and_recent() {
        let store = SledRecordStore::open_temp().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.recent(10).unwrap().is_empty());

        let first = store.append(make_record(4.0, Prediction::Label(1))).unwrap();
        let second = store.append(make_record(5.0, Prediction::Unavailable)).unwrap();
        assert!(second > first);
        assert!(first >= 1);

        let records = store.recent(10).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second);
        assert_eq!(records[0].prediction, Prediction::Unavailable);
        assert_eq!(records[1].reading.weight, 4.0);
    }

    #[test]
    fn test_recent_respects_limit() {
        let store = SledRecordStore::open_temp().unwrap();
        for i in 0..5 {
            store
                .append(make_record(f64::from(i), Prediction::Label(0)))
                .unwrap();
        }
        let records = store.recent(3).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].reading.weight, 4.0);
    }

    #[test]
    fn test_corrupt_entry_skipped() {
        let store = SledRecordStore::open_temp().unwrap();
        store.append(make_record(1.0, Prediction::Label(0))).unwrap();
        store.tree.insert(u64::MAX.to_be_bytes(), &b"garbage"[..]).unwrap();

        let records = store.recent(10).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_open_on_disk_with_flush() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledRecordStore::open(dir.path().join("records.db"), true).unwrap();
        let id = store.append(make_record(1.0, Prediction::Label(1))).unwrap();
        assert_eq!(store.recent(1).unwrap()[0].id, id);
        assert_eq!(store.backend_name(), "Sled");
    }
}
