//! Node metadata, creation modes and error definitions.

use serde::Serialize;
use thiserror::Error;

/// Metadata snapshot of a znode as reported by the coordination service.
///
/// Never built by the proxy itself, only relayed from a coordinator reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStat {
    /// Creation time (milliseconds since epoch).
    pub created: i64,
    /// Last modification time (milliseconds since epoch).
    pub modified: i64,
    /// Data version, incremented on every successful write.
    pub version: i32,
    /// Number of immediate children.
    pub children_count: i32,
    /// Session id owning an ephemeral node, 0 otherwise.
    pub ephemeral_owner: i64,
    /// Payload length in bytes.
    pub data_length: i32,
}

/// Creation-time attributes of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeKind {
    pub ephemeral: bool,
    pub sequential: bool,
}

impl NodeKind {
    pub const PERSISTENT: NodeKind = NodeKind {
        ephemeral: false,
        sequential: false,
    };

    pub fn new(ephemeral: bool, sequential: bool) -> Self {
        Self {
            ephemeral,
            sequential,
        }
    }
}

/// Connectivity of a coordinator session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Session established and usable.
    Connected,
    /// Connection dropped; the client is trying to recover the session.
    Suspended,
    /// Session is gone (expired, closed or rejected).
    Lost,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Suspended => "suspended",
            ConnectionState::Lost => "lost",
        }
    }
}

/// Errors surfaced by znode operations.
///
/// Coordinator adapters translate their native errors into this taxonomy, so
/// nothing above the gateway ever inspects client-specific error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZnodeError {
    /// The requested path does not exist.
    #[error("Node {0} not found")]
    NoSuchNode(String),

    /// Create on an existing non-sequential path.
    #[error("Node {0} already exists")]
    NodeAlreadyExists(String),

    /// Non-recursive delete of a node that still has children.
    #[error("Node {0} has children")]
    NotEmpty(String),

    /// Malformed path or request payload.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport or session failure talking to the coordination service.
    #[error("Connection fault: {0}")]
    ConnectionFault(String),
}

impl ZnodeError {
    /// Stable name of the error kind, used in response bodies and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ZnodeError::NoSuchNode(_) => "NoSuchNode",
            ZnodeError::NodeAlreadyExists(_) => "NodeAlreadyExists",
            ZnodeError::NotEmpty(_) => "NotEmpty",
            ZnodeError::InvalidInput(_) => "InvalidInput",
            ZnodeError::ConnectionFault(_) => "ConnectionFault",
        }
    }

    /// Path the error refers to, when it has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            ZnodeError::NoSuchNode(p)
            | ZnodeError::NodeAlreadyExists(p)
            | ZnodeError::NotEmpty(p) => Some(p),
            ZnodeError::InvalidInput(_) | ZnodeError::ConnectionFault(_) => None,
        }
    }
}

/// Result type for znode operations.
pub type ZnodeResult<T> = Result<T, ZnodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ZnodeError::NoSuchNode("/app".into());
        assert_eq!(err.to_string(), "Node /app not found");

        let err = ZnodeError::ConnectionFault("session expired".into());
        assert!(err.to_string().contains("session expired"));
    }

    #[test]
    fn test_error_kind_and_path() {
        assert_eq!(ZnodeError::NotEmpty("/a".into()).kind(), "NotEmpty");
        assert_eq!(ZnodeError::NotEmpty("/a".into()).path(), Some("/a"));
        assert_eq!(ZnodeError::InvalidInput("bad".into()).path(), None);
    }

    #[test]
    fn test_default_kind_is_persistent() {
        assert_eq!(NodeKind::default(), NodeKind::PERSISTENT);
        assert!(NodeKind::new(true, false).ephemeral);
    }
}
