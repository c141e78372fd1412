use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{info, warn};

pub async fn request_logger(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = start.elapsed().as_millis();
    if response.status().is_server_error() {
        warn!(%method, %path, status, duration_ms, "request failed");
    } else {
        info!(%method, %path, status, duration_ms, "request completed");
    }

    response
}
