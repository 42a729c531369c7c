//! API key gate.
//! Passes everything through unless the gate is enabled.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::server::AppState;

pub const X_API_KEY: &str = "x-api-key";

pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let security = &state.config.security;
    if !security.api_key_enabled {
        return next.run(request).await;
    }

    let supplied = request
        .headers()
        .get(X_API_KEY)
        .and_then(|h| h.to_str().ok());

    match supplied {
        Some(key) if key == security.api_key => next.run(request).await,
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected request without valid API key");
            ApiError::unauthorized().into_response()
        }
    }
}
