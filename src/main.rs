//! Litterbox Hub - telemetry and cleaning coordination service
//!
//! Receives weight/distance/cleanliness readings from the litter-box
//! firmware, classifies whether cleaning is needed, stores every reading,
//! and brokers cleaning requests between an operator and the device.
//!
//! # Usage
//!
//! ```bash
//! # Defaults (0.0.0.0:5000, ./data/records.db, ./models/cleaning_tree.json)
//! cargo run --release
//!
//! # Explicit config file and model
//! ./litterbox-hub --config /etc/litterbox/hub_config.toml --model ./tree.json
//! ```
//!
//! # Environment Variables
//!
//! - `HUB_CONFIG`: Path to a config file (overridden by `--config`)
//! - `HUB_SERVER_ADDR`: Bind address (same as `--addr`)
//! - `HUB_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe the record store on startup

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use litterbox_hub::api::{create_app, HubState};
use litterbox_hub::classifier::{watcher, ClassifierAdapter};
use litterbox_hub::cleaning::CleaningCoordinator;
use litterbox_hub::config::{HubConfig, LogFormat, StorageBackend};
use litterbox_hub::pipeline::{IngestPipeline, ReadingValidator};
use litterbox_hub::storage;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "litterbox-hub")]
#[command(about = "Litterbox telemetry ingestion and cleaning coordination")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:5000")
    #[arg(short, long, env = "HUB_SERVER_ADDR")]
    addr: Option<String>,

    /// Override the classifier artifact path
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Wipe the record store on startup.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,
}

// ============================================================================
// Logging
// ============================================================================

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

fn init_logging(format: LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter())
            .init(),
    }
}

/// Load config with a temporary subscriber so warnings emitted while
/// loading are visible before the configured format is installed.
fn load_config(path: Option<&Path>) -> Result<HubConfig> {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(bootstrap, || HubConfig::load(path))
        .context("Failed to load hub configuration")
}

// ============================================================================
// Database Reset
// ============================================================================

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

/// Remove the sled directory so a fresh store is created.
fn reset_record_store(path: &Path) -> Result<()> {
    if !path.exists() {
        info!(path = %path.display(), "Record store does not exist, nothing to reset");
        return Ok(());
    }

    warn!(path = %path.display(), "RESET_DB detected, wiping record store");
    std::fs::remove_dir_all(path)
        .with_context(|| format!("Failed to remove record store {}", path.display()))?;
    warn!("Record store removed, a fresh one will be created on startup");

    Ok(())
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    ModelWatcher,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpServer => write!(f, "HttpServer"),
            Self::ModelWatcher => write!(f, "ModelWatcher"),
        }
    }
}

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: axum::Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Spawn the model artifact watcher into the JoinSet.
fn spawn_model_watcher(
    task_set: &mut JoinSet<Result<TaskName>>,
    path: PathBuf,
    classifier: Arc<ClassifierAdapter>,
    poll_interval: Duration,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        let reloads =
            watcher::run_model_watcher(path, classifier, poll_interval, cancel_token).await;
        info!("[ModelWatcher] Stopped after {} reloads", reloads);
        Ok(TaskName::ModelWatcher)
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Drain remaining tasks so their shutdown logs are emitted
    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(task_name)) => info!("Supervisor: task {} stopped", task_name),
            Ok(Err(e)) => warn!("Supervisor: task ended with error during shutdown: {}", e),
            Err(e) => warn!("Supervisor: task panicked during shutdown: {}", e),
        }
    }

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = load_config(args.config.as_deref())?;
    config.apply_overrides(args.addr, args.model);
    init_logging(config.logging.format);

    info!("Litterbox Hub v{}", env!("CARGO_PKG_VERSION"));

    // Reset DB check, before the store is opened
    if config.storage.backend == StorageBackend::Sled && should_reset_db(args.reset_db) {
        reset_record_store(&config.storage.path)?;
    }

    let gateway = storage::open_gateway(&config.storage);
    let classifier = Arc::new(ClassifierAdapter::from_artifact(&config.classifier.model_path));
    let pipeline = IngestPipeline::new(
        ReadingValidator::new(&config.payload),
        Arc::clone(&classifier),
        gateway,
    );
    let state = HubState::new(
        pipeline,
        Arc::new(CleaningCoordinator::new()),
        config.classifier.model_path.clone(),
        config.records.default_limit,
    );

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "HTTP server listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, create_app(state), cancel_token.clone());
    if config.classifier.watch {
        spawn_model_watcher(
            &mut task_set,
            config.classifier.model_path.clone(),
            classifier,
            Duration::from_secs(config.classifier.poll_interval_secs),
            cancel_token.clone(),
        );
    }

    run_supervisor(&mut task_set, cancel_token).await?;

    info!("Litterbox Hub shutdown complete");
    Ok(())
}
