//! Process-wide coordinator session.
//!
//! # Responsibilities
//! - Establish the session lazily on first use, at most once even under
//!   concurrent callers
//! - Report current connectivity without blocking
//! - Log connectivity transitions
//! - Close the session on shutdown; a later `acquire` starts from scratch

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::config::ZooKeeperConfig;
use crate::coordination::{ConnectionState, Connector, Coordinator, ZnodeError, ZnodeResult};
use crate::observability::metrics;

struct Session {
    coordinator: Arc<dyn Coordinator>,
    state: watch::Receiver<ConnectionState>,
    monitor: JoinHandle<()>,
}

impl Session {
    /// A lost session never recovers; operations on it keep failing.
    fn is_lost(&self) -> bool {
        *self.state.borrow() == ConnectionState::Lost
    }
}

/// Owner of the single shared coordinator handle.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    config: ZooKeeperConfig,
    current: ArcSwapOption<Session>,
    /// Serializes establishment and teardown.
    lifecycle: Mutex<()>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>, config: ZooKeeperConfig) -> Self {
        Self {
            connector,
            config,
            current: ArcSwapOption::empty(),
            lifecycle: Mutex::new(()),
        }
    }

    /// Shared handle, connecting first if no session exists yet or the
    /// previous one was lost.
    pub async fn acquire(&self) -> ZnodeResult<Arc<dyn Coordinator>> {
        if let Some(session) = self.current.load_full() {
            if !session.is_lost() {
                return Ok(Arc::clone(&session.coordinator));
            }
        }

        let _guard = self.lifecycle.lock().await;
        if let Some(session) = self.current.load_full() {
            if !session.is_lost() {
                return Ok(Arc::clone(&session.coordinator));
            }
            self.current.store(None);
            tracing::warn!(hosts = %self.config.hosts, "Replacing lost ZooKeeper session");
            session.coordinator.close().await;
            session.monitor.abort();
        }

        tracing::info!(
            hosts = %self.config.hosts,
            timeout_secs = self.config.timeout_secs,
            read_only = self.config.read_only,
            "Connecting to ZooKeeper"
        );

        let connect = self.connector.connect(&self.config);
        let coordinator = match tokio::time::timeout(self.config.timeout(), connect).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ZnodeError::ConnectionFault(format!(
                    "timed out after {}s connecting to {}",
                    self.config.timeout_secs, self.config.hosts
                )))
            }
        };

        let state = coordinator.subscribe_state();
        let monitor = tokio::spawn(log_transitions(state.clone()));
        metrics::record_connection_state(*state.borrow() == ConnectionState::Connected);

        self.current.store(Some(Arc::new(Session {
            coordinator: Arc::clone(&coordinator),
            state,
            monitor,
        })));

        tracing::info!(hosts = %self.config.hosts, "ZooKeeper session established");
        Ok(coordinator)
    }

    /// Whether a session exists and is currently connected.
    pub fn is_connected(&self) -> bool {
        self.current
            .load_full()
            .map(|session| *session.state.borrow() == ConnectionState::Connected)
            .unwrap_or(false)
    }

    /// Close the session if one is open. Idempotent.
    pub async fn release(&self) {
        let _guard = self.lifecycle.lock().await;
        if let Some(session) = self.current.swap(None) {
            tracing::info!(hosts = %self.config.hosts, "Closing ZooKeeper connection");
            session.coordinator.close().await;
            session.monitor.abort();
            metrics::record_connection_state(false);
        }
    }
}

async fn log_transitions(mut state: watch::Receiver<ConnectionState>) {
    while state.changed().await.is_ok() {
        let current = *state.borrow_and_update();
        match current {
            ConnectionState::Connected => tracing::info!("ZooKeeper connected"),
            ConnectionState::Suspended => tracing::warn!("ZooKeeper connection suspended"),
            ConnectionState::Lost => tracing::warn!("ZooKeeper connection lost"),
        }
        metrics::record_connection_state(current == ConnectionState::Connected);
    }
}
