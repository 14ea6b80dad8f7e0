//! Hub Configuration - operator-tunable TOML values
//!
//! Each struct implements `Default` so a deployment without a config file
//! behaves exactly like the stock firmware setup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "HUB_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "hub_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a hub deployment.
///
/// Load with `HubConfig::load()` which searches:
/// 1. An explicit path (CLI `--config`)
/// 2. `$HUB_CONFIG` env var
/// 3. `./hub_config.toml`
/// 4. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HubConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Model artifact location and reload policy
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Payload key aliases accepted from device firmware
    #[serde(default)]
    pub payload: PayloadConfig,

    /// Read-back defaults
    #[serde(default)]
    pub records: RecordsConfig,

    /// Log output format
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

/// Which record store backs the persistence gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// sled directory (ignored by the memory backend)
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Flush to disk after every append
    #[serde(default = "default_true")]
    pub flush_on_write: bool,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(defaults::STORAGE_PATH)
}

const fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            flush_on_write: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Poll the artifact for changes and hot-reload it
    #[serde(default = "default_true")]
    pub watch: bool,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_model_path() -> PathBuf {
    PathBuf::from(defaults::MODEL_PATH)
}

const fn default_poll_interval() -> u64 {
    defaults::MODEL_POLL_INTERVAL_SECS
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            watch: true,
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Alternative payload keys mapped onto the canonical schema.
///
/// The stock firmware posts `peso`/`distancia` and the training data calls
/// the flag `limpieza`. `estado` is deliberately absent: add it here only
/// once the firmware contract confirms it carries the same flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadConfig {
    #[serde(default = "default_weight_aliases")]
    pub weight_aliases: Vec<String>,

    #[serde(default = "default_distance_aliases")]
    pub distance_aliases: Vec<String>,

    #[serde(default = "default_cleanliness_aliases")]
    pub cleanliness_aliases: Vec<String>,
}

fn default_weight_aliases() -> Vec<String> {
    vec!["peso".to_string()]
}

fn default_distance_aliases() -> Vec<String> {
    vec!["distancia".to_string()]
}

fn default_cleanliness_aliases() -> Vec<String> {
    vec!["limpieza".to_string()]
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            weight_aliases: default_weight_aliases(),
            distance_aliases: default_distance_aliases(),
            cleanliness_aliases: default_cleanliness_aliases(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

const fn default_limit() -> usize {
    defaults::RECENT_LIMIT_DEFAULT
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Config validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<String>),
}

fn format_validation_errors(errors: &[String]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Loading
// ============================================================================

impl HubConfig {
    /// Load configuration using the standard search order.
    ///
    /// An explicit path must load cleanly. Files found through the env var or
    /// the working directory fall back to defaults with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), "Loaded hub config from --config");
            return Ok(config);
        }

        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded hub config from {}", CONFIG_ENV_VAR);
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./hub_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded hub config from ./{}", LOCAL_CONFIG_FILE);
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys only produce warnings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check semantic constraints, collecting every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.server.addr.parse::<SocketAddr>().is_err() {
            errors.push(format!(
                "server.addr '{}' is not a valid socket address",
                self.server.addr
            ));
        }

        let limit = self.records.default_limit;
        if !(defaults::RECENT_LIMIT_MIN..=defaults::RECENT_LIMIT_MAX).contains(&limit) {
            errors.push(format!(
                "records.default_limit ({limit}) must be within [{}, {}]",
                defaults::RECENT_LIMIT_MIN,
                defaults::RECENT_LIMIT_MAX
            ));
        }

        if self.classifier.poll_interval_secs == 0 {
            errors.push("classifier.poll_interval_secs must be greater than 0".to_string());
        }

        self.payload.check_aliases(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Apply CLI overrides on top of the loaded file.
    pub fn apply_overrides(&mut self, addr: Option<String>, model_path: Option<PathBuf>) {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        if let Some(path) = model_path {
            self.classifier.model_path = path;
        }
    }
}

impl PayloadConfig {
    fn check_aliases(&self, errors: &mut Vec<String>) {
        let fields = [
            (defaults::WEIGHT_KEY, &self.weight_aliases),
            (defaults::DISTANCE_KEY, &self.distance_aliases),
            (defaults::CLEANLINESS_KEY, &self.cleanliness_aliases),
        ];

        let mut claimed: HashMap<&str, &str> = fields
            .iter()
            .map(|(canonical, _)| (*canonical, *canonical))
            .collect();

        for (field, aliases) in fields {
            for alias in aliases {
                let alias = alias.as_str();
                if alias.trim().is_empty() {
                    errors.push(format!("payload: empty alias for '{field}'"));
                    continue;
                }
                if let Some(owner) = claimed.insert(alias, field) {
                    if owner != field {
                        errors.push(format!(
                            "payload: key '{alias}' is claimed by both '{owner}' and '{field}'"
                        ));
                    }
                }
            }
        }
    }
}
