//! Shared data structures for the telemetry pipeline
//!
//! - `Reading`: one validated sensor sample (weight, distance, cleanliness flag)
//! - `Prediction`: classifier verdict, with a degraded-mode sentinel
//! - `Record`: persisted (reading, prediction) pair with a store-assigned id

mod reading;
mod record;

pub use reading::*;
pub use record::*;
