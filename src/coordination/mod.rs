//! Coordination service access.
//!
//! # Data Flow
//! ```text
//! NodeGateway
//!     → manager.rs (single shared session, lazy connect, release on shutdown)
//!     → Coordinator handle
//!         → zookeeper.rs (zookeeper-client adapter)
//!         → memory.rs (in-process tree)
//!     → ConnectionState watch channel → transition logging
//! ```
//!
//! # Design Decisions
//! - One session per process, shared by every in-flight request
//! - The underlying client is trusted to multiplex concurrent calls
//! - Native client errors never leave an adapter; they become `ZnodeError`

pub mod manager;
pub mod memory;
pub mod types;
pub mod zookeeper;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::ZooKeeperConfig;

pub use manager::ConnectionManager;
pub use types::{ConnectionState, NodeKind, NodeStat, ZnodeError, ZnodeResult};

/// A live session with the coordination service.
///
/// Paths handed to a coordinator are already normalized and validated.
/// Implementations must be safe for concurrent use by multiple callers.
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Names of the immediate children of `path`.
    async fn children(&self, path: &str) -> ZnodeResult<Vec<String>>;

    /// Payload and stat of `path`.
    async fn data(&self, path: &str) -> ZnodeResult<(Vec<u8>, NodeStat)>;

    /// Stat of `path`, `None` when absent.
    async fn stat(&self, path: &str) -> ZnodeResult<Option<NodeStat>>;

    /// Create a node, optionally creating missing ancestors as persistent
    /// nodes. Returns the actual created path.
    async fn create(
        &self,
        path: &str,
        data: &[u8],
        kind: NodeKind,
        make_parents: bool,
    ) -> ZnodeResult<String>;

    /// Overwrite the payload of `path` regardless of its version.
    async fn set_data(&self, path: &str, data: &[u8]) -> ZnodeResult<NodeStat>;

    /// Delete `path`; with `recursive` its descendants go first.
    async fn delete(&self, path: &str, recursive: bool) -> ZnodeResult<()>;

    /// Receiver tracking the session's connectivity.
    fn subscribe_state(&self) -> watch::Receiver<ConnectionState>;

    /// End the session.
    async fn close(&self);
}

/// Factory establishing coordinator sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ZooKeeperConfig) -> ZnodeResult<Arc<dyn Coordinator>>;
}
