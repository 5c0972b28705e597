mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_core::client::{TransmissionClient, WatchDirClient};
use vigil_core::settings::{SettingsStore, SqliteSettingsStore};
use vigil_core::topic::{SqliteTopicStore, TopicStore};
use vigil_core::tracker::{DirectTracker, LoginTracker};
use vigil_core::{
    load_config, validate_config, ClientPlugin, ClientsManager, EngineRunner, TrackerPlugin,
    TrackersManager,
};

use api::{create_router, WsBroadcaster, WsLogger};
use state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("VIGIL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    // Stores must be loaded before the engine's first scheduled tick
    let topic_store: Arc<dyn TopicStore> = Arc::new(
        SqliteTopicStore::new(&config.database.path).context("Failed to create topic store")?,
    );
    let settings_store: Arc<dyn SettingsStore> = Arc::new(
        SqliteSettingsStore::new(&config.database.path)
            .context("Failed to create settings store")?,
    );
    info!("Stores initialized");

    // Tracker plugins from config
    let mut tracker_plugins: Vec<Arc<dyn TrackerPlugin>> = Vec::new();
    if let Some(ref direct_config) = config.trackers.direct {
        info!(
            "Initializing direct tracker for domains {:?}",
            direct_config.domains
        );
        tracker_plugins.push(Arc::new(DirectTracker::new(direct_config)));
    }
    if let Some(ref login_config) = config.trackers.login {
        info!("Initializing login tracker at {}", login_config.base_url);
        tracker_plugins.push(Arc::new(LoginTracker::new(
            login_config,
            Arc::clone(&settings_store),
        )));
    }
    if tracker_plugins.is_empty() {
        info!("No trackers configured");
    }

    // Client plugins from config
    let mut client_plugins: Vec<Arc<dyn ClientPlugin>> = Vec::new();
    if let Some(ref transmission_config) = config.clients.transmission {
        info!(
            "Initializing Transmission client at {}",
            transmission_config.url
        );
        client_plugins.push(Arc::new(TransmissionClient::new(
            transmission_config.clone(),
            Arc::clone(&settings_store),
        )));
    }
    if let Some(ref watch_dir_config) = config.clients.watch_dir {
        info!(
            "Initializing watch directory client at {:?}",
            watch_dir_config.path
        );
        client_plugins.push(Arc::new(WatchDirClient::new(watch_dir_config.clone())));
    }
    if client_plugins.is_empty() {
        info!("No download clients configured");
    }

    let trackers = Arc::new(TrackersManager::new(
        tracker_plugins,
        topic_store,
        Duration::from_secs(config.engine.check_timeout_secs),
        config.engine.max_parallel_checks,
    ));
    let clients = Arc::new(ClientsManager::new(
        client_plugins,
        config.clients.default.clone(),
    ));

    // WebSocket broadcaster carries engine events to connected observers
    let ws_broadcaster = WsBroadcaster::default();
    let logger = Arc::new(WsLogger::new(ws_broadcaster.clone()));

    let engine = EngineRunner::new(
        Arc::clone(&trackers),
        Arc::clone(&clients),
        logger,
        Duration::from_secs(config.engine.interval_secs),
    )
    .context("Failed to create engine")?;

    engine.start();
    info!(
        interval_secs = config.engine.interval_secs,
        "Engine scheduling loop started"
    );

    // Create app state and router
    let state = Arc::new(AppState::new(
        config.clone(),
        trackers,
        clients,
        engine.clone(),
        ws_broadcaster,
    ));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    engine.stop();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
