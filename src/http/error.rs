//! Mapping of znode errors onto HTTP responses.
//!
//! | Error               | Status |
//! |---------------------|--------|
//! | `NoSuchNode`        | 404    |
//! | `NodeAlreadyExists` | 409    |
//! | `NotEmpty`          | 409    |
//! | `InvalidInput`      | 400    |
//! | `ConnectionFault`   | 500    |

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::coordination::ZnodeError;
use crate::http::models::ErrorResponse;

const GENERIC_FAULT: &str = "coordination service failure";

/// An error ready to be rendered as a JSON response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    /// Translate a znode error. `context` names the failed action in 500
    /// details ("getting node", "creating node", ...). Fault text reaches the
    /// client only with `expose_details`.
    pub fn from_znode(err: ZnodeError, context: &str, expose_details: bool) -> Self {
        let status = match &err {
            ZnodeError::NoSuchNode(_) => StatusCode::NOT_FOUND,
            ZnodeError::NodeAlreadyExists(_) | ZnodeError::NotEmpty(_) => StatusCode::CONFLICT,
            ZnodeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ZnodeError::ConnectionFault(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let detail = match &err {
            ZnodeError::ConnectionFault(message) => {
                tracing::error!(context, error = %message, "Coordination service fault");
                if expose_details {
                    format!("Error {}: {}", context, message)
                } else {
                    format!("Error {}: {}", context, GENERIC_FAULT)
                }
            }
            other => other.to_string(),
        };

        Self {
            status,
            body: ErrorResponse {
                detail,
                error_type: Some(err.kind()),
                path: err.path().map(str::to_string),
            },
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorResponse {
                detail: "Invalid or missing API key".to_string(),
                error_type: None,
                path: None,
            },
        }
    }

    pub fn timeout() -> Self {
        Self {
            status: StatusCode::REQUEST_TIMEOUT,
            body: ErrorResponse {
                detail: "Request timed out".to_string(),
                error_type: None,
                path: None,
            },
        }
    }

    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse {
                detail: "Internal server error".to_string(),
                error_type: None,
                path: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Last-resort handler for panics inside request handling.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %message, "Unhandled fault while serving request");
    ApiError::internal().into_response()
}
