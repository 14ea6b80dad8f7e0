//! Hub Configuration Module
//!
//! Provides deployment configuration loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line
//! 2. `HUB_CONFIG` environment variable (path to TOML file)
//! 3. `hub_config.toml` in the current working directory
//! 4. Built-in defaults (matching the stock firmware setup)
//!
//! The loaded [`HubConfig`] is passed down explicitly to the components that
//! need it; nothing reads configuration from global state.

mod hub_config;
pub mod defaults;
pub mod validation;

pub use hub_config::*;
