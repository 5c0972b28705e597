//! Recording logger for asserting on engine event order.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::engine::EngineLogger;

/// One event observed by the logger, in emission order.
#[derive(Debug, Clone)]
pub enum RecordedEvent {
    Started {
        run_id: String,
    },
    Finished {
        run_id: String,
        error: Option<String>,
    },
    Info {
        run_id: String,
        message: String,
    },
    Failed {
        run_id: String,
        message: String,
    },
    Downloaded {
        run_id: String,
        message: String,
        size: usize,
    },
}

impl RecordedEvent {
    /// Event kind label for order assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            RecordedEvent::Started { .. } => "started",
            RecordedEvent::Finished { .. } => "finished",
            RecordedEvent::Info { .. } => "info",
            RecordedEvent::Failed { .. } => "failed",
            RecordedEvent::Downloaded { .. } => "downloaded",
        }
    }

    pub fn run_id(&self) -> &str {
        match self {
            RecordedEvent::Started { run_id }
            | RecordedEvent::Finished { run_id, .. }
            | RecordedEvent::Info { run_id, .. }
            | RecordedEvent::Failed { run_id, .. }
            | RecordedEvent::Downloaded { run_id, .. } => run_id,
        }
    }
}

/// `EngineLogger` that records every event for later assertions.
#[derive(Default)]
pub struct RecordingLogger {
    events: RwLock<Vec<RecordedEvent>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events observed so far, in order.
    pub async fn events(&self) -> Vec<RecordedEvent> {
        self.events.read().await.clone()
    }

    /// Number of `finished` events observed so far.
    pub async fn finished_count(&self) -> usize {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Finished { .. }))
            .count()
    }

    /// Block until at least `count` runs have finished.
    ///
    /// Panics after five seconds so a stuck engine fails the test instead
    /// of hanging it.
    pub async fn wait_for_finished(&self, count: usize) {
        for _ in 0..500 {
            if self.finished_count().await >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Timed out waiting for {} finished events", count);
    }
}

#[async_trait]
impl EngineLogger for RecordingLogger {
    async fn started(&self, run_id: &str) {
        self.events.write().await.push(RecordedEvent::Started {
            run_id: run_id.to_string(),
        });
    }

    async fn finished(&self, run_id: &str, _finish_time: DateTime<Utc>, error: Option<&str>) {
        self.events.write().await.push(RecordedEvent::Finished {
            run_id: run_id.to_string(),
            error: error.map(|e| e.to_string()),
        });
    }

    async fn info(&self, run_id: &str, message: &str) {
        self.events.write().await.push(RecordedEvent::Info {
            run_id: run_id.to_string(),
            message: message.to_string(),
        });
    }

    async fn failed(&self, run_id: &str, message: &str) {
        self.events.write().await.push(RecordedEvent::Failed {
            run_id: run_id.to_string(),
            message: message.to_string(),
        });
    }

    async fn downloaded(&self, run_id: &str, message: &str, size: usize) {
        self.events.write().await.push(RecordedEvent::Downloaded {
            run_id: run_id.to_string(),
            message: message.to_string(),
            size,
        });
    }
}
