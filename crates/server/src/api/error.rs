//! Error payloads shared by the API handlers.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use vigil_core::{ClientError, EngineError, TopicError, TrackerError};

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn response(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

pub fn tracker_error(e: TrackerError) -> ApiError {
    let status = match &e {
        TrackerError::NoMatchingTracker(_) | TrackerError::InvalidSettings(_) => {
            StatusCode::BAD_REQUEST
        }
        TrackerError::UnknownTracker(_) => StatusCode::NOT_FOUND,
        TrackerError::Topic(TopicError::NotFound(_)) => StatusCode::NOT_FOUND,
        TrackerError::Topic(_) | TrackerError::Plugin(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    response(status, e)
}

pub fn client_error(e: ClientError) -> ApiError {
    let status = match &e {
        ClientError::UnknownClient(_) => StatusCode::NOT_FOUND,
        ClientError::NoDefaultClient | ClientError::InvalidSettings(_) => StatusCode::BAD_REQUEST,
        ClientError::Plugin(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    response(status, e)
}

pub fn engine_error(e: EngineError) -> ApiError {
    let status = match &e {
        EngineError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
    };
    response(status, e)
}
