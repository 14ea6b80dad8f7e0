//! Litterbox Hub: telemetry ingestion and cleaning coordination
//!
//! Backend for an IoT litter box. The device posts periodic readings and
//! polls for cleaning requests; an operator raises those requests.
//!
//! ## Architecture
//!
//! - **Pipeline**: validate -> classify -> persist -> respond, only
//!   malformed input fails a call
//! - **Classifier**: hot-swappable decision tree, null prediction when no
//!   model is loaded
//! - **Storage**: append-only sled record store behind a gateway
//! - **Cleaning**: single request flag shared by operator and device
//! - **API**: axum router with a uniform JSON envelope

pub mod api;
pub mod classifier;
pub mod cleaning;
pub mod config;
pub mod pipeline;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::HubConfig;

// Re-export commonly used types
pub use types::{NewRecord, Prediction, Reading, Record, RecordId};

pub use classifier::{ClassifierAdapter, ModelState};
pub use cleaning::CleaningCoordinator;
pub use pipeline::{IngestError, IngestPipeline, IngestResult, ReadingValidator, ValidationError};
pub use storage::{PersistenceGateway, StorageError};
