//! Record Storage
//!
//! Persists (reading, prediction) records behind the [`PersistenceGateway`].
//! The backend is chosen from config; a backend that cannot be opened is
//! replaced by a [`DetachedStore`] so ingestion keeps running.

pub mod gateway;
pub mod persistence;
mod sled_store;

pub use gateway::{clamp_limit, PersistenceGateway};
pub use persistence::{DetachedStore, InMemoryStore, RecordStore, StorageError};
pub use sled_store::SledRecordStore;

use std::sync::Arc;

use crate::config::{StorageBackend, StorageConfig};

/// Build the gateway for the configured backend.
pub fn open_gateway(config: &StorageConfig) -> PersistenceGateway {
    let store: Arc<dyn RecordStore> = match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory record store, records are lost on restart");
            Arc::new(InMemoryStore::new())
        }
        StorageBackend::Sled => match SledRecordStore::open(&config.path, config.flush_on_write) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!(
                    path = %config.path.display(),
                    error = %e,
                    "Failed to open record store. Readings will not be persisted."
                );
                Arc::new(DetachedStore::new(e.to_string()))
            }
        },
    };
    PersistenceGateway::new(store)
}
