//! ZooKeeper REST proxy library.
//!
//! Exposes a ZooKeeper ensemble's znode tree over a small JSON/HTTP API.

pub mod config;
pub mod coordination;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use coordination::ConnectionManager;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
