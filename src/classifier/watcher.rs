//! Polling-based model artifact watcher.
//!
//! Checks the artifact's mtime on a fixed interval. When a change is
//! detected, debounces (training jobs often write in stages), then reloads
//! the classifier. A failed reload leaves the active model in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;

use super::ClassifierAdapter;
use crate::config::defaults::MODEL_RELOAD_DEBOUNCE_MS;

/// Run the watcher loop until `cancel` fires.
///
/// Returns the number of successful reloads.
pub async fn run_model_watcher(
    path: PathBuf,
    classifier: Arc<ClassifierAdapter>,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> u64 {
    tracing::info!(path = %path.display(), "Model watcher started");

    let debounce = Duration::from_millis(MODEL_RELOAD_DEBOUNCE_MS);
    let mut last_mtime = get_mtime(&path);
    let mut reloads = 0;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::info!(reloads, "Model watcher stopping");
                return reloads;
            }
            () = tokio::time::sleep(poll_interval) => {}
        }

        // Artifact missing or unreadable: keep the current model, retry later
        let Some(current) = get_mtime(&path) else {
            if last_mtime.is_some() {
                tracing::warn!(
                    path = %path.display(),
                    "Model artifact not accessible, keeping current model"
                );
                last_mtime = None;
            }
            continue;
        };

        if last_mtime == Some(current) {
            continue;
        }

        tokio::time::sleep(debounce).await;
        if get_mtime(&path) != Some(current) {
            // Still being written
            continue;
        }
        last_mtime = Some(current);

        match classifier.reload_from(&path) {
            Ok(()) => reloads += 1,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Model hot-reload failed");
            }
        }
    }
}

/// Modification time of a file, `None` on any error.
fn get_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
