//! Shared setup for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use zk_rest_proxy::config::{Backend, ProxyConfig};
use zk_rest_proxy::lifecycle::{connector_for, Shutdown};
use zk_rest_proxy::{ConnectionManager, HttpServer};

/// A proxy running on an ephemeral port over the in-memory backend.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub connections: Arc<ConnectionManager>,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn node(&self, path: &str) -> String {
        self.url(&format!("/znodes/v1{}", path))
    }

    /// Trigger shutdown and wait for the server to drain.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
        self.connections.release().await;
    }
}

/// Start a proxy with default settings.
pub async fn start_proxy() -> TestProxy {
    start_proxy_with(ProxyConfig::default()).await
}

/// Start a proxy with the given settings; the backend is forced to memory.
pub async fn start_proxy_with(mut config: ProxyConfig) -> TestProxy {
    config.zookeeper.backend = Backend::Memory;

    let connections = Arc::new(ConnectionManager::new(
        connector_for(&config.zookeeper),
        config.zookeeper.clone(),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::clone(&connections));
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestProxy {
        addr,
        client: reqwest::Client::new(),
        connections,
        shutdown,
        handle,
    }
}
