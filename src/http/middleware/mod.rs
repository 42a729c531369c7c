//! Request middleware.

pub mod api_key;
pub mod metrics;
pub mod timeout;

pub use api_key::api_key_middleware;
pub use metrics::track_requests;
pub use timeout::request_timeout;
