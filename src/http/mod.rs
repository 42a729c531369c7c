//! HTTP surface of the proxy.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower layers)
//!     → request.rs (request ID)
//!     → middleware/ (API key gate, request metrics)
//!     → handlers.rs (decode body, call gateway)
//!     → error.rs (znode error → status + JSON detail)
//! ```

pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod models;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
