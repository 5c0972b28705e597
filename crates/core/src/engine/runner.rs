//! Engine runner implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::client::ClientsManager;
use crate::metrics;
use crate::tracker::{OutcomeKind, TrackersManager};

use super::logger::EngineLogger;
use super::types::{EngineError, EngineStatus};

/// How often the scheduling loop re-evaluates whether a run is due. Keeping
/// this short means `set_interval` takes effect at the next evaluation
/// instead of after a full interval sleep.
const TICK: Duration = Duration::from_secs(1);

/// Drives periodic and on-demand tracker checks.
///
/// Clones share all state, so one instance can live in the HTTP state while
/// another drives the scheduling loop.
#[derive(Clone)]
pub struct EngineRunner {
    trackers: Arc<TrackersManager>,
    clients: Arc<ClientsManager>,
    logger: Arc<dyn EngineLogger>,

    // Runtime state
    running: Arc<AtomicBool>,
    interval: Arc<RwLock<Duration>>,
    last_execute: Arc<RwLock<Option<DateTime<Utc>>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl std::fmt::Debug for EngineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRunner")
            .field("running", &self.running)
            .field("interval", &self.interval)
            .field("last_execute", &self.last_execute)
            .finish_non_exhaustive()
    }
}

impl EngineRunner {
    /// Create a runner. The interval must be positive.
    pub fn new(
        trackers: Arc<TrackersManager>,
        clients: Arc<ClientsManager>,
        logger: Arc<dyn EngineLogger>,
        interval: Duration,
    ) -> Result<Self, EngineError> {
        if interval.is_zero() {
            return Err(EngineError::InvalidConfiguration(
                "Interval must be positive".to_string(),
            ));
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            trackers,
            clients,
            logger,
            running: Arc::new(AtomicBool::new(false)),
            interval: Arc::new(RwLock::new(interval)),
            last_execute: Arc::new(RwLock::new(None)),
            shutdown_tx,
        })
    }

    /// Spawn the background scheduling loop.
    pub fn start(&self) {
        let engine = self.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Engine scheduling loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Engine scheduling loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(TICK) => {
                        if engine.run_is_due().await {
                            engine.trigger_execute();
                        }
                    }
                }
            }
            info!("Engine scheduling loop stopped");
        });
    }

    /// Stop the scheduling loop. An in-flight run finishes on its own.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Request an immediate run.
    ///
    /// Returns `true` when a run was started. When a run is already in
    /// flight the request is dropped, not queued, and `false` is returned.
    pub fn trigger_execute(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Run already in flight, trigger dropped");
            return false;
        }

        let engine = self.clone();
        tokio::spawn(async move {
            engine.run().await;
            engine.running.store(false, Ordering::SeqCst);
        });
        true
    }

    /// Change the interval between automatic runs. Takes effect at the
    /// next scheduling evaluation, not retroactively to an in-flight wait.
    pub async fn set_interval(&self, interval: Duration) -> Result<(), EngineError> {
        if interval.is_zero() {
            return Err(EngineError::InvalidConfiguration(
                "Interval must be positive".to_string(),
            ));
        }
        *self.interval.write().await = interval;
        info!(interval_secs = interval.as_secs(), "Engine interval updated");
        Ok(())
    }

    /// Current engine state, readable concurrently with a run.
    pub async fn get_status(&self) -> EngineStatus {
        EngineStatus {
            running: self.running.load(Ordering::Relaxed),
            interval_secs: self.interval.read().await.as_secs(),
            last_execute: *self.last_execute.read().await,
        }
    }

    async fn run_is_due(&self) -> bool {
        let interval = *self.interval.read().await;
        match *self.last_execute.read().await {
            None => true,
            Some(last) => match chrono::Duration::from_std(interval) {
                Ok(elapsed) => Utc::now() >= last + elapsed,
                Err(_) => false,
            },
        }
    }

    /// One full run: exactly one `started`, per-topic events in store
    /// order, exactly one `finished`. Errors never leave the engine stuck.
    async fn run(&self) {
        let run_id = uuid::Uuid::new_v4().to_string();
        let run_start = std::time::Instant::now();

        self.logger.started(&run_id).await;
        *self.last_execute.write().await = Some(Utc::now());

        let run_error = match self.trackers.check_all() {
            Err(e) => Some(e.to_string()),
            Ok(mut outcomes) => {
                while let Some(outcome) = outcomes.next().await {
                    metrics::TOPIC_CHECKS
                        .with_label_values(&[outcome.kind.as_str()])
                        .inc();

                    match outcome.kind {
                        OutcomeKind::Unchanged => {
                            self.logger
                                .info(&run_id, &format!("{}: no new content", outcome.title))
                                .await;
                        }
                        OutcomeKind::Failed(reason) => {
                            self.logger
                                .failed(&run_id, &format!("{}: {}", outcome.title, reason))
                                .await;
                        }
                        OutcomeKind::Downloaded(item) => {
                            let size = item.torrent.len();
                            match self.clients.send(&item, None).await {
                                Ok(()) => {
                                    metrics::TORRENTS_DOWNLOADED.inc();
                                    metrics::DOWNLOADED_BYTES.inc_by(size as u64);
                                    self.logger
                                        .downloaded(
                                            &run_id,
                                            &format!("Downloaded: {}", item.title),
                                            size,
                                        )
                                        .await;
                                }
                                Err(e) => {
                                    warn!(title = item.title.as_str(), "Client rejected item: {}", e);
                                    self.logger
                                        .failed(
                                            &run_id,
                                            &format!("{}: client rejected item: {}", outcome.title, e),
                                        )
                                        .await;
                                }
                            }
                        }
                    }
                }
                None
            }
        };

        let result = if run_error.is_some() { "failed" } else { "success" };
        metrics::ENGINE_RUNS.with_label_values(&[result]).inc();
        metrics::ENGINE_RUN_DURATION
            .with_label_values(&[result])
            .observe(run_start.elapsed().as_secs_f64());

        self.logger
            .finished(&run_id, Utc::now(), run_error.as_deref())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockClient, MockTracker, RecordingLogger};
    use crate::topic::SqliteTopicStore;

    fn runner(logger: Arc<RecordingLogger>) -> EngineRunner {
        let store = Arc::new(SqliteTopicStore::in_memory().unwrap());
        let trackers = Arc::new(TrackersManager::new(
            vec![Arc::new(MockTracker::new("mock", "example.com"))],
            store,
            Duration::from_secs(5),
            2,
        ));
        let clients = Arc::new(ClientsManager::new(
            vec![Arc::new(MockClient::new("mock"))],
            Some("mock".to_string()),
        ));
        EngineRunner::new(trackers, clients, logger, Duration::from_secs(3600)).unwrap()
    }

    #[tokio::test]
    async fn test_new_rejects_zero_interval() {
        let logger = Arc::new(RecordingLogger::new());
        let store = Arc::new(SqliteTopicStore::in_memory().unwrap());
        let trackers = Arc::new(TrackersManager::new(
            vec![],
            store,
            Duration::from_secs(5),
            1,
        ));
        let clients = Arc::new(ClientsManager::new(vec![], None));

        let err = EngineRunner::new(trackers, clients, logger, Duration::ZERO).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_set_interval_rejects_zero() {
        let logger = Arc::new(RecordingLogger::new());
        let engine = runner(logger);

        let err = engine.set_interval(Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfiguration(_)));

        engine.set_interval(Duration::from_secs(10)).await.unwrap();
        assert_eq!(engine.get_status().await.interval_secs, 10);
    }

    #[tokio::test]
    async fn test_status_before_any_run() {
        let logger = Arc::new(RecordingLogger::new());
        let engine = runner(logger);

        let status = engine.get_status().await;
        assert!(!status.running);
        assert_eq!(status.interval_secs, 3600);
        assert!(status.last_execute.is_none());
    }

    #[tokio::test]
    async fn test_trigger_records_last_execute() {
        let logger = Arc::new(RecordingLogger::new());
        let engine = runner(logger.clone());

        assert!(engine.trigger_execute());
        logger.wait_for_finished(1).await;

        assert!(engine.get_status().await.last_execute.is_some());
    }
}
