//! In-process znode tree.
//!
//! Reproduces the node/stat semantics the proxy relies on: versions start at
//! 0, sequential suffixes come from the parent's child-change counter and are
//! zero padded to 10 digits, ephemeral nodes are owned by the creating
//! session and disappear when it closes. Sessions created by one
//! `MemoryConnector` share a single tree, like clients of one ensemble.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::{watch, RwLock};

use crate::config::ZooKeeperConfig;
use crate::coordination::{
    ConnectionState, Connector, Coordinator, NodeKind, NodeStat, ZnodeError, ZnodeResult,
};
use crate::gateway::path;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[derive(Debug, Clone)]
struct MemNode {
    data: Vec<u8>,
    created: i64,
    modified: i64,
    version: i32,
    ephemeral_owner: i64,
    // child-change counter, source of sequential suffixes
    cversion: i32,
}

impl MemNode {
    fn new(data: Vec<u8>, ephemeral_owner: i64) -> Self {
        let now = now_ms();
        Self {
            data,
            created: now,
            modified: now,
            version: 0,
            ephemeral_owner,
            cversion: 0,
        }
    }
}

#[derive(Debug)]
struct Tree {
    nodes: BTreeMap<String, MemNode>,
}

impl Tree {
    fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), MemNode::new(Vec::new(), 0));
        Self { nodes }
    }

    fn child_names(&self, parent: &str) -> Vec<String> {
        let prefix = if parent == "/" {
            "/".to_string()
        } else {
            format!("{}/", parent)
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| {
                let rest = &key[prefix.len()..];
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect()
    }

    fn stat(&self, path: &str) -> Option<NodeStat> {
        self.nodes.get(path).map(|node| NodeStat {
            created: node.created,
            modified: node.modified,
            version: node.version,
            children_count: self.child_names(path).len() as i32,
            ephemeral_owner: node.ephemeral_owner,
            data_length: node.data.len() as i32,
        })
    }

    fn insert(&mut self, path: &str, data: Vec<u8>, ephemeral_owner: i64) -> ZnodeResult<()> {
        let parent = path::parent(path)
            .ok_or_else(|| ZnodeError::NodeAlreadyExists(path.to_string()))?;
        let parent_node = self
            .nodes
            .get_mut(parent)
            .ok_or_else(|| ZnodeError::NoSuchNode(path.to_string()))?;
        if parent_node.ephemeral_owner != 0 {
            return Err(ZnodeError::InvalidInput(format!(
                "ephemeral node {} cannot have children",
                parent
            )));
        }
        parent_node.cversion += 1;
        self.nodes.insert(path.to_string(), MemNode::new(data, ephemeral_owner));
        Ok(())
    }

    fn remove_subtree(&mut self, path: &str) {
        let prefix = format!("{}/", path);
        let doomed: Vec<String> = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in doomed {
            self.nodes.remove(&key);
        }
        self.remove(path);
    }

    fn remove(&mut self, path: &str) {
        self.nodes.remove(path);
        if let Some(parent) = path::parent(path).and_then(|p| self.nodes.get_mut(p)) {
            parent.cversion += 1;
        }
    }
}

/// Connector handing out sessions on one shared in-memory tree.
pub struct MemoryConnector {
    tree: Arc<RwLock<Tree>>,
    next_session: AtomicI64,
    connections: AtomicUsize,
    connect_delay: Duration,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            tree: Arc::new(RwLock::new(Tree::new())),
            next_session: AtomicI64::new(0x1000),
            connections: AtomicUsize::new(0),
            connect_delay: Duration::ZERO,
        }
    }

    /// Delay every session establishment, to widen connect races in tests.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    /// Number of sessions established so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _config: &ZooKeeperConfig) -> ZnodeResult<Arc<dyn Coordinator>> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        let session_id = self.next_session.fetch_add(1, Ordering::SeqCst);
        let (state_tx, _) = watch::channel(ConnectionState::Connected);
        tracing::debug!(session_id, "In-memory session opened");
        Ok(Arc::new(MemoryCoordinator {
            tree: Arc::clone(&self.tree),
            session_id,
            state_tx,
        }))
    }
}

/// One session on a shared in-memory tree.
pub struct MemoryCoordinator {
    tree: Arc<RwLock<Tree>>,
    session_id: i64,
    state_tx: watch::Sender<ConnectionState>,
}

impl MemoryCoordinator {
    fn ensure_open(&self) -> ZnodeResult<()> {
        match *self.state_tx.borrow() {
            ConnectionState::Connected => Ok(()),
            state => Err(ZnodeError::ConnectionFault(format!(
                "session 0x{:x} is {}",
                self.session_id,
                state.as_str()
            ))),
        }
    }
}

#[async_trait]
impl Coordinator for MemoryCoordinator {
    async fn children(&self, path: &str) -> ZnodeResult<Vec<String>> {
        self.ensure_open()?;
        let tree = self.tree.read().await;
        if !tree.nodes.contains_key(path) {
            return Err(ZnodeError::NoSuchNode(path.to_string()));
        }
        Ok(tree.child_names(path))
    }

    async fn data(&self, path: &str) -> ZnodeResult<(Vec<u8>, NodeStat)> {
        self.ensure_open()?;
        let tree = self.tree.read().await;
        match (tree.nodes.get(path), tree.stat(path)) {
            (Some(node), Some(stat)) => Ok((node.data.clone(), stat)),
            _ => Err(ZnodeError::NoSuchNode(path.to_string())),
        }
    }

    async fn stat(&self, path: &str) -> ZnodeResult<Option<NodeStat>> {
        self.ensure_open()?;
        Ok(self.tree.read().await.stat(path))
    }

    async fn create(
        &self,
        path: &str,
        data: &[u8],
        kind: NodeKind,
        make_parents: bool,
    ) -> ZnodeResult<String> {
        self.ensure_open()?;
        let mut tree = self.tree.write().await;

        if make_parents {
            for ancestor in path::ancestors(path) {
                if !tree.nodes.contains_key(ancestor) {
                    tree.insert(ancestor, Vec::new(), 0)?;
                }
            }
        }

        let actual = if kind.sequential {
            let parent = path::parent(path).unwrap_or("/");
            let sequence = tree
                .nodes
                .get(parent)
                .map(|node| node.cversion)
                .ok_or_else(|| ZnodeError::NoSuchNode(path.to_string()))?;
            format!("{}{:010}", path, sequence)
        } else {
            path.to_string()
        };

        if tree.nodes.contains_key(&actual) {
            return Err(ZnodeError::NodeAlreadyExists(actual));
        }

        let owner = if kind.ephemeral { self.session_id } else { 0 };
        tree.insert(&actual, data.to_vec(), owner)?;
        Ok(actual)
    }

    async fn set_data(&self, path: &str, data: &[u8]) -> ZnodeResult<NodeStat> {
        self.ensure_open()?;
        let mut tree = self.tree.write().await;
        let node = tree
            .nodes
            .get_mut(path)
            .ok_or_else(|| ZnodeError::NoSuchNode(path.to_string()))?;
        node.data = data.to_vec();
        node.version += 1;
        node.modified = now_ms();
        tree.stat(path).ok_or_else(|| ZnodeError::NoSuchNode(path.to_string()))
    }

    async fn delete(&self, path: &str, recursive: bool) -> ZnodeResult<()> {
        self.ensure_open()?;
        if path == "/" {
            return Err(ZnodeError::InvalidInput("the root node cannot be deleted".into()));
        }
        let mut tree = self.tree.write().await;
        if !tree.nodes.contains_key(path) {
            return Err(ZnodeError::NoSuchNode(path.to_string()));
        }
        if recursive {
            tree.remove_subtree(path);
        } else if !tree.child_names(path).is_empty() {
            return Err(ZnodeError::NotEmpty(path.to_string()));
        } else {
            tree.remove(path);
        }
        Ok(())
    }

    fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    async fn close(&self) {
        let mut tree = self.tree.write().await;
        let owned: Vec<String> = tree
            .nodes
            .iter()
            .filter(|(_, node)| node.ephemeral_owner == self.session_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &owned {
            tree.remove(key);
        }
        self.state_tx.send_replace(ConnectionState::Lost);
        tracing::debug!(
            session_id = self.session_id,
            ephemerals_removed = owned.len(),
            "In-memory session closed"
        );
    }
}
