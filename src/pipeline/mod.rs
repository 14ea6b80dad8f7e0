//! Telemetry Ingestion
//!
//! ```text
//! payload ─▶ ReadingValidator ─▶ ClassifierAdapter ─▶ PersistenceGateway ─▶ IngestResult
//!              (InvalidInput)      (null on failure)     (logged on failure)
//! ```
//!
//! Only the validator can fail a call.

mod ingest;
pub mod validator;

pub use ingest::{IngestError, IngestOutcome, IngestPipeline, IngestResult, IngestStats, IngestStatsSnapshot};
pub use validator::{ReadingValidator, ValidationError};
