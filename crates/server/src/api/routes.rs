use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{clients, execute, handlers, middleware, topics, trackers, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Config
        .route("/config", get(handlers::get_config))
        // Topics
        .route("/topics", get(topics::list_topics).post(topics::add_topic))
        .route(
            "/topics/{id}",
            get(topics::get_topic)
                .put(topics::update_topic)
                .delete(topics::remove_topic),
        )
        .route("/parse", post(topics::parse_url))
        // Engine control
        .route(
            "/execute",
            get(execute::get_status)
                .put(execute::set_interval)
                .post(execute::trigger),
        )
        // Trackers
        .route("/trackers", get(trackers::list_trackers))
        .route(
            "/trackers/{name}",
            get(trackers::get_settings).put(trackers::set_settings),
        )
        .route("/trackers/{name}/check", get(trackers::check_connection))
        // Clients
        .route("/clients", get(clients::list_clients))
        .route(
            "/clients/{name}",
            get(clients::get_settings).put(clients::set_settings),
        )
        .route("/clients/{name}/check", get(clients::check_connection))
        // Engine event stream
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(axum::middleware::from_fn(middleware::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
