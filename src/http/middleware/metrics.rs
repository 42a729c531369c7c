//! Per-request metrics for matched routes.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::request_id;
use crate::observability::metrics;

pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let id = request_id(&request);

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::warn!(
            request_id = %id,
            method = %method,
            route = %route,
            status = %status,
            "Request failed"
        );
    } else {
        tracing::debug!(
            request_id = %id,
            method = %method,
            route = %route,
            status = %status,
            "Request served"
        );
    }
    metrics::record_request(&method, status.as_u16(), &route, start);
    response
}
