use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected configuration value, e.g. a zero interval.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Snapshot of the engine state, readable concurrently with a run.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    /// Whether a run is in flight right now.
    pub running: bool,
    /// Seconds between automatic runs.
    pub interval_secs: u64,
    /// When the previous run started, if any run has happened.
    pub last_execute: Option<DateTime<Utc>>,
}
