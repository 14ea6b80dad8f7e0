//! System-wide default constants.
//!
//! Centralises magic numbers used across the hub.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Server
// ============================================================================

/// Bind address used by the sensor firmware out of the box.
pub const SERVER_ADDR: &str = "0.0.0.0:5000";

// ============================================================================
// Records read-back
// ============================================================================

/// Records returned by the recent-records endpoint when no limit is given.
pub const RECENT_LIMIT_DEFAULT: usize = 10;

/// Lower bound every caller-supplied limit is clamped to.
pub const RECENT_LIMIT_MIN: usize = 1;

/// Upper bound every caller-supplied limit is clamped to.
pub const RECENT_LIMIT_MAX: usize = 100;

// ============================================================================
// Storage
// ============================================================================

/// Default sled directory for telemetry records.
pub const STORAGE_PATH: &str = "./data/records.db";

/// Name of the sled tree holding records.
pub const RECORDS_TREE: &str = "records";

// ============================================================================
// Classifier
// ============================================================================

/// Default location of the decision-tree artifact.
pub const MODEL_PATH: &str = "./models/cleaning_tree.json";

/// Interval between model file mtime checks (seconds).
pub const MODEL_POLL_INTERVAL_SECS: u64 = 2;

/// Delay after a detected model change before reloading (milliseconds).
///
/// Training jobs often write the artifact in several passes.
pub const MODEL_RELOAD_DEBOUNCE_MS: u64 = 500;

// ============================================================================
// Payload
// ============================================================================

/// Canonical payload key for the weight reading.
pub const WEIGHT_KEY: &str = "weight";

/// Canonical payload key for the distance reading.
pub const DISTANCE_KEY: &str = "distance";

/// Canonical payload key for the cleanliness flag.
pub const CLEANLINESS_KEY: &str = "cleanlinessFlag";
