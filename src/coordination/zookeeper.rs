//! ZooKeeper adapter over the `zookeeper-client` crate.
//!
//! # Responsibilities
//! - Establish a session with configured hosts, session timeout and
//!   read-only flag
//! - Translate client errors into `ZnodeError`
//! - Create missing ancestors and delete subtrees, which the client does not
//!   do on its own
//! - Publish session state changes on a watch channel

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use zookeeper_client as zk;

use crate::config::ZooKeeperConfig;
use crate::coordination::{
    ConnectionState, Connector, Coordinator, NodeKind, NodeStat, ZnodeError, ZnodeResult,
};
use crate::gateway::path;

/// Connector dialing a real ZooKeeper ensemble.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZooKeeperConnector;

#[async_trait]
impl Connector for ZooKeeperConnector {
    async fn connect(&self, config: &ZooKeeperConfig) -> ZnodeResult<Arc<dyn Coordinator>> {
        let mut connector = zk::Client::connector();
        connector
            .session_timeout(config.timeout())
            .readonly(config.read_only);
        let client = connector.connect(&config.hosts).await.map_err(|e| {
            ZnodeError::ConnectionFault(format!("connect to {}: {}", config.hosts, e))
        })?;

        let (state_tx, _) = watch::channel(ConnectionState::Connected);
        let state_task = spawn_state_relay(client.state_watcher(), state_tx.clone());

        Ok(Arc::new(ZooKeeperCoordinator {
            client,
            state_tx,
            state_task,
        }))
    }
}

fn map_session_state(state: zk::SessionState) -> (ConnectionState, bool) {
    match state {
        zk::SessionState::SyncConnected | zk::SessionState::ConnectedReadOnly => {
            (ConnectionState::Connected, false)
        }
        zk::SessionState::Disconnected => (ConnectionState::Suspended, false),
        zk::SessionState::Expired | zk::SessionState::Closed | zk::SessionState::AuthFailed => {
            (ConnectionState::Lost, true)
        }
        #[allow(unreachable_patterns)]
        _ => (ConnectionState::Suspended, false),
    }
}

fn spawn_state_relay(
    mut watcher: zk::StateWatcher,
    state_tx: watch::Sender<ConnectionState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let (state, terminal) = map_session_state(watcher.changed().await);
            state_tx.send_replace(state);
            if terminal {
                break;
            }
        }
    })
}

fn translate(err: zk::Error, path: &str) -> ZnodeError {
    match err {
        zk::Error::NoNode => ZnodeError::NoSuchNode(path.to_string()),
        zk::Error::NodeExists => ZnodeError::NodeAlreadyExists(path.to_string()),
        zk::Error::NotEmpty => ZnodeError::NotEmpty(path.to_string()),
        zk::Error::NoChildrenForEphemerals => {
            ZnodeError::InvalidInput(format!("ephemeral parent of {} cannot have children", path))
        }
        other => ZnodeError::ConnectionFault(other.to_string()),
    }
}

fn to_node_stat(stat: &zk::Stat) -> NodeStat {
    NodeStat {
        created: stat.ctime,
        modified: stat.mtime,
        version: stat.version,
        children_count: stat.num_children,
        ephemeral_owner: stat.ephemeral_owner,
        data_length: stat.data_length,
    }
}

fn create_mode(kind: NodeKind) -> zk::CreateMode {
    match (kind.ephemeral, kind.sequential) {
        (false, false) => zk::CreateMode::Persistent,
        (false, true) => zk::CreateMode::PersistentSequential,
        (true, false) => zk::CreateMode::Ephemeral,
        (true, true) => zk::CreateMode::EphemeralSequential,
    }
}

/// A live ZooKeeper session.
pub struct ZooKeeperCoordinator {
    client: zk::Client,
    state_tx: watch::Sender<ConnectionState>,
    state_task: JoinHandle<()>,
}

impl ZooKeeperCoordinator {
    async fn create_once(&self, path: &str, data: &[u8], kind: NodeKind) -> ZnodeResult<String> {
        let options = create_mode(kind).with_acls(zk::Acls::anyone_all());
        let (_, sequence) = self
            .client
            .create(path, data, &options)
            .await
            .map_err(|e| translate(e, path))?;
        if kind.sequential {
            Ok(format!("{}{}", path, sequence))
        } else {
            Ok(path.to_string())
        }
    }

    async fn ensure_ancestors(&self, path: &str) -> ZnodeResult<()> {
        for ancestor in path::ancestors(path) {
            match self.create_once(ancestor, &[], NodeKind::PERSISTENT).await {
                Ok(_) | Err(ZnodeError::NodeAlreadyExists(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn delete_subtree(&self, path: &str) -> ZnodeResult<()> {
        // post-order: a node is deleted only after its children
        let mut pending = vec![(path.to_string(), false)];
        while let Some((node, expanded)) = pending.pop() {
            if expanded {
                match self.client.delete(&node, None).await {
                    Ok(()) | Err(zk::Error::NoNode) => {}
                    Err(e) => return Err(translate(e, &node)),
                }
                continue;
            }
            let children = match self.client.list_children(&node).await {
                Ok(children) => children,
                Err(zk::Error::NoNode) if node != path => continue,
                Err(e) => return Err(translate(e, &node)),
            };
            pending.push((node.clone(), true));
            for name in children {
                pending.push((path::child(&node, &name), false));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Coordinator for ZooKeeperCoordinator {
    async fn children(&self, path: &str) -> ZnodeResult<Vec<String>> {
        self.client
            .list_children(path)
            .await
            .map_err(|e| translate(e, path))
    }

    async fn data(&self, path: &str) -> ZnodeResult<(Vec<u8>, NodeStat)> {
        let (data, stat) = self
            .client
            .get_data(path)
            .await
            .map_err(|e| translate(e, path))?;
        Ok((data, to_node_stat(&stat)))
    }

    async fn stat(&self, path: &str) -> ZnodeResult<Option<NodeStat>> {
        let stat = self
            .client
            .check_stat(path)
            .await
            .map_err(|e| translate(e, path))?;
        Ok(stat.as_ref().map(to_node_stat))
    }

    async fn create(
        &self,
        path: &str,
        data: &[u8],
        kind: NodeKind,
        make_parents: bool,
    ) -> ZnodeResult<String> {
        match self.create_once(path, data, kind).await {
            Err(ZnodeError::NoSuchNode(_)) if make_parents => {
                self.ensure_ancestors(path).await?;
                self.create_once(path, data, kind).await
            }
            result => result,
        }
    }

    async fn set_data(&self, path: &str, data: &[u8]) -> ZnodeResult<NodeStat> {
        let stat = self
            .client
            .set_data(path, data, None)
            .await
            .map_err(|e| translate(e, path))?;
        Ok(to_node_stat(&stat))
    }

    async fn delete(&self, path: &str, recursive: bool) -> ZnodeResult<()> {
        if path == "/" {
            return Err(ZnodeError::InvalidInput("the root node cannot be deleted".into()));
        }
        if recursive {
            if self.stat(path).await?.is_none() {
                return Err(ZnodeError::NoSuchNode(path.to_string()));
            }
            self.delete_subtree(path).await
        } else {
            self.client
                .delete(path, None)
                .await
                .map_err(|e| translate(e, path))
        }
    }

    fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    async fn close(&self) {
        self.state_task.abort();
        self.state_tx.send_replace(ConnectionState::Lost);
        // The session itself ends when the last client handle is dropped.
    }
}
