//! Classifier output and the persisted (reading, prediction) pair.

use serde::{Deserialize, Serialize};

use super::Reading;

/// Identifier assigned by the persistence gateway on append.
pub type RecordId = u64;

/// Label meaning the box needs cleaning.
pub const LABEL_NEEDS_CLEANING: i64 = 1;

/// Classifier verdict for a reading.
///
/// `Unavailable` is the degraded-mode sentinel used when no model is loaded
/// or inference could not run. It serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prediction {
    Label(i64),
    #[default]
    Unavailable,
}

impl Prediction {
    pub const fn label(self) -> Option<i64> {
        match self {
            Self::Label(l) => Some(l),
            Self::Unavailable => None,
        }
    }

    pub const fn is_available(self) -> bool {
        matches!(self, Self::Label(_))
    }

    pub const fn needs_cleaning(self) -> bool {
        matches!(self, Self::Label(LABEL_NEEDS_CLEANING))
    }
}

impl From<Option<i64>> for Prediction {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Unavailable, Self::Label)
    }
}

impl Serialize for Prediction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.label().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Prediction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<i64>::deserialize(deserializer).map(Self::from)
    }
}

/// A reading and its prediction before the store has assigned an id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewRecord {
    pub reading: Reading,
    pub prediction: Prediction,
}

/// Persisted (reading, prediction) pair. Never mutated once written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(flatten)]
    pub reading: Reading,
    pub prediction: Prediction,
}

impl Record {
    pub const fn from_new(id: RecordId, new: NewRecord) -> Self {
        Self {
            id,
            reading: new.reading,
            prediction: new.prediction,
        }
    }
}
