//! Topic API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use vigil_core::tracker::TopicPreview;
use vigil_core::Topic;

use crate::state::AppState;

use super::error::{tracker_error, ApiError};

/// Request body for adding a topic.
#[derive(Debug, Deserialize)]
pub struct AddTopicBody {
    /// Subscription URL.
    pub url: String,
    /// Plugin-specific settings, validated by the owning plugin.
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// Response for topic creation.
#[derive(Debug, Serialize)]
pub struct AddTopicResponse {
    pub id: i64,
}

/// Request body for the parse preview.
#[derive(Debug, Deserialize)]
pub struct ParseBody {
    pub url: String,
}

/// List all watched topics.
pub async fn list_topics(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Topic>>, ApiError> {
    let topics = state
        .trackers()
        .get_watching_torrents()
        .map_err(tracker_error)?;
    Ok(Json(topics))
}

/// Add a topic for the URL via the plugin that claims it.
pub async fn add_topic(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddTopicBody>,
) -> Result<(StatusCode, Json<AddTopicResponse>), ApiError> {
    let settings = if body.settings.is_null() {
        serde_json::json!({})
    } else {
        body.settings
    };

    let id = state
        .trackers()
        .add_topic(&body.url, &settings)
        .await
        .map_err(tracker_error)?;

    Ok((StatusCode::CREATED, Json(AddTopicResponse { id })))
}

/// Get one topic by id.
pub async fn get_topic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Topic>, ApiError> {
    let topic = state.trackers().get_topic(id).map_err(tracker_error)?;
    Ok(Json(topic))
}

/// Update a topic's plugin-specific settings.
pub async fn update_topic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(settings): Json<serde_json::Value>,
) -> Result<StatusCode, ApiError> {
    state
        .trackers()
        .update_watch(id, &settings)
        .map_err(tracker_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a topic. Unknown ids are a 404.
pub async fn remove_topic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.trackers().remove_topic(id).map_err(tracker_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Preview what adding a URL would create, without persisting.
pub async fn parse_url(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ParseBody>,
) -> Result<Json<TopicPreview>, ApiError> {
    let preview = state
        .trackers()
        .prepare_add_topic(&body.url)
        .await
        .map_err(tracker_error)?;
    Ok(Json(preview))
}
