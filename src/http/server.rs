//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, deadline, request ID, CORS,
//!   panic guard)
//! - Gate znode routes behind the API key
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{HeaderName, HeaderValue},
    middleware,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{CorsConfig, ProxyConfig};
use crate::coordination::{ConnectionManager, ZnodeError};
use crate::gateway::NodeGateway;
use crate::http::error::{handle_panic, ApiError};
use crate::http::handlers::{
    create_node, delete_node, get_node, head_node, list_root, update_node,
};
use crate::http::health::{health, service_info};
use crate::http::middleware::{api_key_middleware, request_timeout, track_requests};
use crate::http::request::{UuidRequestId, X_REQUEST_ID};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: NodeGateway,
    pub connections: Arc<ConnectionManager>,
    pub config: Arc<ProxyConfig>,
}

impl AppState {
    /// Render a znode error for the given action.
    pub fn error(&self, err: ZnodeError, context: &str) -> ApiError {
        ApiError::from_znode(err, context, self.config.security.expose_error_details)
    }
}

/// HTTP server for the REST proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over a shared connection manager.
    pub fn new(config: ProxyConfig, connections: Arc<ConnectionManager>) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            gateway: NodeGateway::new(Arc::clone(&connections)),
            connections,
            config,
        };

        Self {
            router: build_router(state),
        }
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal is broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
///
/// The body limit sits outermost: its response body has no `Default`,
/// which CORS needs for preflight replies.
pub fn build_router(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    let znodes = Router::new()
        .route("/znodes/v1", get(list_root))
        .route(
            "/znodes/v1/{*path}",
            get(get_node)
                .head(head_node)
                .post(create_node)
                .put(update_node)
                .delete(delete_node),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), api_key_middleware))
        .route_layer(middleware::from_fn(track_requests));

    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .merge(znodes)
        .layer(middleware::from_fn_with_state(
            Duration::from_secs(config.timeouts.request_secs),
            request_timeout,
        ))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(cors_layer(&config.cors)),
        )
}

/// Build the CORS layer from the allowed origins.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allows_any() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([HeaderName::from_static("x-request-id")])
}
