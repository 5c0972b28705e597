//! Logger capability consumed by the engine runner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Receives run lifecycle and per-topic events.
///
/// The runner calls these in a strict order per run: one `started`, then
/// zero or more `info`/`failed`/`downloaded` in topic order, then one
/// `finished`. Implementations own delivery (fan-out to observers, log
/// sinks) and must not block the runner meaningfully.
#[async_trait]
pub trait EngineLogger: Send + Sync {
    /// A run began.
    async fn started(&self, run_id: &str);

    /// A run completed. `error` is set when the run aborted before
    /// consuming every topic.
    async fn finished(&self, run_id: &str, finish_time: DateTime<Utc>, error: Option<&str>);

    /// A topic was checked and nothing new was found.
    async fn info(&self, run_id: &str, message: &str);

    /// A topic check failed; the run continues.
    async fn failed(&self, run_id: &str, message: &str);

    /// A new torrent was found and handed to a client.
    async fn downloaded(&self, run_id: &str, message: &str, size: usize);
}

/// Logger that forwards run events to the tracing subscriber.
#[derive(Debug, Default)]
pub struct TracingLogger;

#[async_trait]
impl EngineLogger for TracingLogger {
    async fn started(&self, run_id: &str) {
        info!(run_id, "Engine run started");
    }

    async fn finished(&self, run_id: &str, finish_time: DateTime<Utc>, error: Option<&str>) {
        match error {
            Some(reason) => error!(run_id, %finish_time, reason, "Engine run aborted"),
            None => info!(run_id, %finish_time, "Engine run finished"),
        }
    }

    async fn info(&self, run_id: &str, message: &str) {
        info!(run_id, "{}", message);
    }

    async fn failed(&self, run_id: &str, message: &str) {
        error!(run_id, "{}", message);
    }

    async fn downloaded(&self, run_id: &str, message: &str, size: usize) {
        info!(run_id, size, "{}", message);
    }
}
