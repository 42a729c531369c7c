//! Startup helpers.
//!
//! The proxy starts even when ZooKeeper is unreachable: the warm-up connect
//! only logs its failure, and requests retry the connection lazily.

use std::sync::Arc;

use crate::config::{Backend, ZooKeeperConfig};
use crate::coordination::memory::MemoryConnector;
use crate::coordination::zookeeper::ZooKeeperConnector;
use crate::coordination::{ConnectionManager, Connector};

/// Connector for the configured backend.
pub fn connector_for(config: &ZooKeeperConfig) -> Arc<dyn Connector> {
    match config.backend {
        Backend::ZooKeeper => Arc::new(ZooKeeperConnector),
        Backend::Memory => {
            tracing::warn!("Using in-memory coordination backend; data is not persisted");
            Arc::new(MemoryConnector::new())
        }
    }
}

/// Establish the session ahead of the first request. Returns whether it
/// succeeded.
pub async fn warm_up(connections: &ConnectionManager) -> bool {
    match connections.acquire().await {
        Ok(_) => {
            tracing::info!("ZooKeeper session established at startup");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "ZooKeeper unavailable at startup; will retry on demand");
            false
        }
    }
}
