//! Engine control API handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use vigil_core::EngineStatus;

use crate::state::AppState;

use super::error::{engine_error, ApiError};

/// Request body for changing the run interval.
#[derive(Debug, Deserialize)]
pub struct SetIntervalBody {
    pub interval_secs: u64,
}

/// Response for a manual trigger.
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    /// False when a run was already in flight and the trigger was dropped.
    pub triggered: bool,
}

/// Current engine status.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<EngineStatus> {
    Json(state.engine().get_status().await)
}

/// Change the interval between automatic runs.
pub async fn set_interval(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetIntervalBody>,
) -> Result<StatusCode, ApiError> {
    state
        .engine()
        .set_interval(Duration::from_secs(body.interval_secs))
        .await
        .map_err(engine_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Request an immediate run.
pub async fn trigger(State(state): State<Arc<AppState>>) -> Json<TriggerResponse> {
    Json(TriggerResponse {
        triggered: state.engine().trigger_execute(),
    })
}
