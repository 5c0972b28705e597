use std::sync::Arc;

use vigil_core::config::SanitizedConfig;
use vigil_core::{ClientsManager, Config, EngineRunner, TrackersManager};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    trackers: Arc<TrackersManager>,
    clients: Arc<ClientsManager>,
    engine: EngineRunner,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        trackers: Arc<TrackersManager>,
        clients: Arc<ClientsManager>,
        engine: EngineRunner,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            trackers,
            clients,
            engine,
            ws_broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn trackers(&self) -> &TrackersManager {
        &self.trackers
    }

    pub fn clients(&self) -> &ClientsManager {
        &self.clients
    }

    pub fn engine(&self) -> &EngineRunner {
        &self.engine
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
