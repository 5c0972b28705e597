//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Engine runs (counts, duration)
//! - Topic checks by outcome
//! - Downloaded payloads

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

/// Engine runs total by result.
pub static ENGINE_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vigil_engine_runs_total", "Total engine runs"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Engine run duration in seconds.
pub static ENGINE_RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vigil_engine_run_duration_seconds",
            "Duration of full engine runs",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["result"],
    )
    .unwrap()
});

/// Topic checks total by outcome.
pub static TOPIC_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vigil_topic_checks_total", "Total topic checks"),
        &["outcome"], // "unchanged", "failed", "downloaded"
    )
    .unwrap()
});

/// Torrents handed to a download client.
pub static TORRENTS_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vigil_torrents_downloaded_total",
        "Total torrents handed to a download client",
    )
    .unwrap()
});

/// Torrent payload bytes downloaded from trackers.
pub static DOWNLOADED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vigil_downloaded_bytes_total",
        "Total torrent payload bytes fetched from trackers",
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ENGINE_RUNS.clone()),
        Box::new(ENGINE_RUN_DURATION.clone()),
        Box::new(TOPIC_CHECKS.clone()),
        Box::new(TORRENTS_DOWNLOADED.clone()),
        Box::new(DOWNLOADED_BYTES.clone()),
    ]
}
