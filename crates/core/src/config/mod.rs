//! Configuration loading and validation.

mod loader;
mod types;
mod validate;

use thiserror::Error;

pub use loader::{load_config, load_config_from_str};
pub use types::{
    ClientsConfig, Config, DatabaseConfig, DirectTrackerConfig, EngineConfig, LoginTrackerConfig,
    SanitizedConfig, ServerConfig, TrackersConfig, TransmissionConfig, WatchDirConfig,
};
pub use validate::validate_config;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
