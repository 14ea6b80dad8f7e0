//! Reading Validator
//!
//! Maps a raw JSON payload onto the canonical [`Reading`] schema. Each
//! field is looked up by its canonical key first, then by the configured
//! firmware aliases. Values are coerced, never range-checked: the device
//! contract does not define valid ranges.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::config::defaults::{CLEANLINESS_KEY, DISTANCE_KEY, WEIGHT_KEY};
use crate::config::PayloadConfig;
use crate::types::Reading;

/// Why a payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("payload must be a JSON object")]
    NotAnObject,
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("field '{field}' has invalid value {value}")]
    TypeMismatch { field: &'static str, value: String },
}

impl ValidationError {
    /// Canonical field name the error refers to, if any.
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::NotAnObject => None,
            Self::MissingField { field } | Self::TypeMismatch { field, .. } => Some(*field),
        }
    }
}

/// One entry of the payload schema.
#[derive(Debug, Clone)]
struct FieldSpec {
    canonical: &'static str,
    aliases: Vec<String>,
}

impl FieldSpec {
    /// First present, non-null value under the canonical key or an alias.
    fn lookup<'a>(&self, payload: &'a Map<String, Value>) -> Option<&'a Value> {
        std::iter::once(self.canonical)
            .chain(self.aliases.iter().map(String::as_str))
            .filter_map(|key| payload.get(key))
            .find(|v| !v.is_null())
    }

    fn mismatch(&self, value: &Value) -> ValidationError {
        ValidationError::TypeMismatch {
            field: self.canonical,
            value: value.to_string(),
        }
    }

    fn required<'a>(&self, payload: &'a Map<String, Value>) -> Result<&'a Value, ValidationError> {
        self.lookup(payload).ok_or(ValidationError::MissingField {
            field: self.canonical,
        })
    }

    /// Coerce to a finite real.
    fn real(&self, payload: &Map<String, Value>) -> Result<f64, ValidationError> {
        let value = self.required(payload)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| self.mismatch(value))
    }

    /// Coerce to an integer; integral floats are accepted.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn integer(&self, payload: &Map<String, Value>) -> Result<i64, ValidationError> {
        let value = self.required(payload)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| self.mismatch(value))
    }
}

/// Typed schema for incoming telemetry payloads.
#[derive(Debug, Clone)]
pub struct ReadingValidator {
    weight: FieldSpec,
    distance: FieldSpec,
    cleanliness: FieldSpec,
}

impl Default for ReadingValidator {
    fn default() -> Self {
        Self::new(&PayloadConfig::default())
    }
}

impl ReadingValidator {
    pub fn new(config: &PayloadConfig) -> Self {
        Self {
            weight: FieldSpec {
                canonical: WEIGHT_KEY,
                aliases: config.weight_aliases.clone(),
            },
            distance: FieldSpec {
                canonical: DISTANCE_KEY,
                aliases: config.distance_aliases.clone(),
            },
            cleanliness: FieldSpec {
                canonical: CLEANLINESS_KEY,
                aliases: config.cleanliness_aliases.clone(),
            },
        }
    }

    /// Validate with the current instant as the reading timestamp.
    pub fn validate(&self, payload: &Value) -> Result<Reading, ValidationError> {
        self.validate_at(payload, Utc::now())
    }

    /// Validate with an explicit timestamp.
    pub fn validate_at(
        &self,
        payload: &Value,
        timestamp: DateTime<Utc>,
    ) -> Result<Reading, ValidationError> {
        let object = payload.as_object().ok_or(ValidationError::NotAnObject)?;

        let weight = self.weight.real(object)?;
        let distance = self.distance.real(object)?;
        let cleanliness_flag = self.cleanliness.integer(object)?;

        Ok(Reading::new(weight, distance, cleanliness_flag, timestamp))
    }
}
