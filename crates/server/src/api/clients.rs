//! Client settings API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use vigil_core::ClientInfo;

use crate::state::AppState;

use super::error::{client_error, ApiError};
use super::trackers::CheckResponse;

/// Registered clients with their form schemas.
pub async fn list_clients(State(state): State<Arc<AppState>>) -> Json<Vec<ClientInfo>> {
    Json(state.clients().list())
}

/// Stored settings for one client, secrets redacted.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Option<serde_json::Value>>, ApiError> {
    let settings = state
        .clients()
        .get_settings(&name)
        .await
        .map_err(client_error)?;
    Ok(Json(settings))
}

/// Validate and store settings for one client.
pub async fn set_settings(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(settings): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    state
        .clients()
        .set_settings(&name, settings)
        .await
        .map_err(client_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Probe connectivity to the client back-end.
pub async fn check_connection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<CheckResponse> {
    Json(CheckResponse {
        status: state.clients().check_connection(&name).await,
    })
}
