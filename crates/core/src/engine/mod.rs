//! Engine runner for periodic and on-demand tracker checks.
//!
//! The runner owns the interval timer and the single-flight guard: at most
//! one run is in flight at any instant, and every run emits exactly one
//! `started`, per-topic events in order, then exactly one `finished` to the
//! [`EngineLogger`].

mod logger;
mod runner;
mod types;

pub use logger::{EngineLogger, TracingLogger};
pub use runner::EngineRunner;
pub use types::{EngineError, EngineStatus};
