//! Cleaning Coordination
//!
//! One outstanding cleaning request shared between an operator and the
//! device. The operator raises it, the device polls it and clears it once
//! the cycle is done.
//!
//! ```text
//!            request()
//!   Idle ──────────────▶ Pending
//!    ▲                      │
//!    └──────────────────────┘
//!          acknowledge()
//! ```
//!
//! The flag is a single atomic so every transition is linearizable and
//! `query` never waits on a writer.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Coordination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CleaningState {
    Idle,
    Pending,
}

impl From<bool> for CleaningState {
    fn from(requested: bool) -> Self {
        if requested {
            Self::Pending
        } else {
            Self::Idle
        }
    }
}

/// Snapshot for status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningStatus {
    pub requested: bool,
    pub state: CleaningState,
    pub requests: u64,
    pub acknowledgements: u64,
    pub last_transition: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct CleaningCoordinator {
    requested: AtomicBool,
    requests: AtomicU64,
    acknowledgements: AtomicU64,
    /// Unix millis of the last Idle/Pending flip, 0 = never
    last_transition_ms: AtomicI64,
}

impl CleaningCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the request. Idempotent; returns the resulting flag.
    pub fn request(&self) -> bool {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !self.requested.swap(true, Ordering::SeqCst) {
            self.mark_transition();
            tracing::info!("Cleaning requested");
        }
        true
    }

    /// Current flag, no side effects.
    pub fn query(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Clear the request. Idempotent; returns the resulting flag (always false).
    pub fn acknowledge(&self) -> bool {
        self.acknowledgements.fetch_add(1, Ordering::Relaxed);
        if self.requested.swap(false, Ordering::SeqCst) {
            self.mark_transition();
            tracing::info!("Cleaning acknowledged by device");
        }
        false
    }

    pub fn state(&self) -> CleaningState {
        self.query().into()
    }

    pub fn status(&self) -> CleaningStatus {
        let requested = self.query();
        let ms = self.last_transition_ms.load(Ordering::Relaxed);
        CleaningStatus {
            requested,
            state: requested.into(),
            requests: self.requests.load(Ordering::Relaxed),
            acknowledgements: self.acknowledgements.load(Ordering::Relaxed),
            last_transition: (ms != 0)
                .then(|| DateTime::<Utc>::from_timestamp_millis(ms))
                .flatten(),
        }
    }

    fn mark_transition(&self) {
        self.last_transition_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initially_idle() {
        let c = CleaningCoordinator::new();
        assert!(!c.query());
        assert_eq!(c.state(), CleaningState::Idle);
        assert_eq!(c.status().last_transition, None);
    }

    #[test]
    fn test_request_then_acknowledge() {
        let c = CleaningCoordinator::new();
        assert!(c.request());
        assert!(c.query());
        assert_eq!(c.state(), CleaningState::Pending);

        assert!(!c.acknowledge());
        assert!(!c.query());
    }

    #[test]
    fn test_idempotent_operations() {
        let c = CleaningCoordinator::new();
        c.request();
        c.request();
        assert!(c.query());

        c.acknowledge();
        c.acknowledge();
        assert!(!c.query());

        let status = c.status();
        assert_eq!(status.requests, 2);
        assert_eq!(status.acknowledgements, 2);
        assert!(status.last_transition.is_some());
    }

    #[test]
    fn test_query_does_not_mutate() {
        let c = CleaningCoordinator::new();
        c.request();
        for _ in 0..5 {
            assert!(c.query());
        }
        assert_eq!(c.status().requests, 1);
    }

    #[test]
    fn test_concurrent_actors_stay_consistent() {
        let c = Arc::new(CleaningCoordinator::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if i % 2 == 0 {
                            assert!(c.request());
                        } else {
                            assert!(!c.acknowledge());
                        }
                        let _ = c.query();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let status = c.status();
        assert_eq!(status.requests, 4000);
        assert_eq!(status.acknowledgements, 4000);
        assert_eq!(status.state, CleaningState::from(status.requested));

        c.acknowledge();
        assert!(!c.query());
    }

    #[test]
    fn test_status_serializes() {
        let c = CleaningCoordinator::new();
        c.request();
        let v = serde_json::to_value(c.status()).unwrap();
        assert_eq!(v["requested"], true);
        assert_eq!(v["state"], "pending");
        assert!(v["lastTransition"].is_string());
    }
}
