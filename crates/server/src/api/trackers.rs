//! Tracker settings API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use vigil_core::tracker::TrackerInfo;

use crate::state::AppState;

use super::error::{tracker_error, ApiError};

/// Response for connectivity probes.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub status: bool,
}

/// Registered trackers with their form schemas.
pub async fn list_trackers(State(state): State<Arc<AppState>>) -> Json<Vec<TrackerInfo>> {
    Json(state.trackers().list())
}

/// Stored settings for one tracker, secrets redacted.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Option<serde_json::Value>>, ApiError> {
    let settings = state
        .trackers()
        .get_settings(&name)
        .await
        .map_err(tracker_error)?;
    Ok(Json(settings))
}

/// Validate and store settings for one tracker.
pub async fn set_settings(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(settings): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    state
        .trackers()
        .set_settings(&name, settings)
        .await
        .map_err(tracker_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Probe connectivity to the tracker site.
pub async fn check_connection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<CheckResponse> {
    Json(CheckResponse {
        status: state.trackers().check_connection(&name).await,
    })
}
