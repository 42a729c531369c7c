//! Liveness and service information endpoints.
//!
//! Health never fails: lost connectivity is reported as `degraded` with a
//! 200, and probing it never triggers a connection attempt.

use axum::{extract::State, Json};

use crate::http::models::{HealthResponse, ServiceInfo};
use crate::http::server::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = state.connections.is_connected();
    Json(HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        zookeeper_connected: connected,
    })
}

/// GET /
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "ZooKeeper REST Proxy",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}
