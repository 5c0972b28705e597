//! Request-level middleware.

use axum::{extract::Request, middleware::Next, response::Response};

use crate::metrics::{normalize_path, HTTP_REQUESTS_TOTAL};

/// Count every request by method, normalized path, and status.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), &path, response.status().as_str()])
        .inc();

    response
}
