//! ZooKeeper REST proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!   HTTP client
//!       │
//!       ▼
//!  ┌──────────────────────────────────────────────┐
//!  │ http: tower layers → api key → handlers      │
//!  │                                   │          │
//!  │                                   ▼          │
//!  │ gateway: path rules, payload codec, metrics  │
//!  │                                   │          │
//!  │                                   ▼          │
//!  │ coordination: ConnectionManager (one session)│
//!  └───────────────────────────────────┬──────────┘
//!                                      ▼
//!                              ZooKeeper ensemble
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use zk_rest_proxy::config::load_config;
use zk_rest_proxy::lifecycle::{connector_for, wait_for_signal, warm_up, Shutdown};
use zk_rest_proxy::observability::{logging, metrics};
use zk_rest_proxy::{ConnectionManager, HttpServer};

#[derive(Parser)]
#[command(name = "zk-rest-proxy")]
#[command(about = "REST proxy for ZooKeeper", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "ZK_REST_PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "zk-rest-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        zk_hosts = %config.zookeeper.hosts,
        backend = ?config.zookeeper.backend,
        api_key_enabled = config.security.api_key_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let connections = Arc::new(ConnectionManager::new(
        connector_for(&config.zookeeper),
        config.zookeeper.clone(),
    ));
    warm_up(&connections).await;

    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signals = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signals.trigger();
    });

    let server = HttpServer::new(config, Arc::clone(&connections));
    let result = server.run(listener, server_shutdown).await;

    connections.release().await;
    tracing::info!("Shutdown complete");
    result.map_err(Into::into)
}
