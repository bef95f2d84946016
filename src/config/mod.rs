//! Configuration management for Renderbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use renderbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Batch concurrency: {}", config.batch.concurrency);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `RENDERBOX__<section>__<key>`
//!
//! Examples:
//! - `RENDERBOX__BATCH__CONCURRENCY=8`
//! - `RENDERBOX__VIDEO__POLL_INTERVAL=2s`
//! - `RENDERBOX__RETRY__STANDARD__MAX_RETRIES=5`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/renderbox.toml`.
//! This can be overridden using the `RENDERBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::DurationMs;
pub use models::{BatchConfig, Config, RetryPresetConfig, RetryPresets, VideoConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`RENDERBOX__*`)
    /// 2. TOML file (default: `config/renderbox.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails (zero concurrency, shrinking backoff, etc.).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
