//! Znode operations exposed to the HTTP layer.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::coordination::{ConnectionManager, NodeKind, NodeStat, ZnodeResult};
use crate::gateway::codec::{self, Decoded, Payload};
use crate::gateway::path;
use crate::observability::metrics;

/// Decoded payload and metadata of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub path: String,
    pub data: Decoded,
    pub stat: NodeStat,
}

/// Translation layer between logical znode operations and the shared
/// coordinator session.
///
/// Holds no state of its own; every call borrows the handle from the
/// `ConnectionManager` for its duration.
#[derive(Clone)]
pub struct NodeGateway {
    connections: Arc<ConnectionManager>,
}

impl NodeGateway {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// Immediate children of `path`, in service order.
    pub async fn list_children(&self, path: &str) -> ZnodeResult<Vec<String>> {
        let path = path::resolve(path)?;
        observe("list_children", async {
            let zk = self.connections.acquire().await?;
            zk.children(&path).await
        })
        .await
    }

    /// Stat of `path`, or `None` when it does not exist.
    pub async fn exists(&self, path: &str) -> ZnodeResult<Option<NodeStat>> {
        let path = path::resolve(path)?;
        observe("exists", async {
            let zk = self.connections.acquire().await?;
            zk.stat(&path).await
        })
        .await
    }

    /// Decoded payload and stat of `path`.
    pub async fn get_data(&self, path: &str) -> ZnodeResult<NodeData> {
        let path = path::resolve(path)?;
        observe("get_data", async {
            let zk = self.connections.acquire().await?;
            let (bytes, stat) = zk.data(&path).await?;
            Ok(NodeData {
                path: path.clone(),
                data: codec::decode(&bytes),
                stat,
            })
        })
        .await
    }

    /// Create a node, creating missing ancestors. Returns the actual path,
    /// which carries the service-assigned suffix for sequential nodes.
    pub async fn create(
        &self,
        path: &str,
        payload: &Payload,
        kind: NodeKind,
    ) -> ZnodeResult<String> {
        let path = path::resolve_create(path, kind.sequential)?;
        let bytes = codec::encode(payload)?;
        observe("create", async {
            let zk = self.connections.acquire().await?;
            let created = zk.create(&path, &bytes, kind, true).await?;
            tracing::debug!(
                requested = %path,
                created = %created,
                ephemeral = kind.ephemeral,
                sequential = kind.sequential,
                "Node created"
            );
            Ok(created)
        })
        .await
    }

    /// Overwrite the payload of `path` unconditionally.
    pub async fn set_data(&self, path: &str, payload: &Payload) -> ZnodeResult<NodeStat> {
        let path = path::resolve(path)?;
        let bytes = codec::encode(payload)?;
        observe("set_data", async {
            let zk = self.connections.acquire().await?;
            zk.set_data(&path, &bytes).await
        })
        .await
    }

    /// Delete `path`, and with `recursive` all of its descendants first.
    pub async fn delete(&self, path: &str, recursive: bool) -> ZnodeResult<()> {
        let path = path::resolve(path)?;
        observe("delete", async {
            let zk = self.connections.acquire().await?;
            zk.delete(&path, recursive).await?;
            tracing::debug!(path = %path, recursive, "Node deleted");
            Ok(())
        })
        .await
    }
}

async fn observe<T, F>(op: &'static str, fut: F) -> ZnodeResult<T>
where
    F: Future<Output = ZnodeResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::record_operation(op, outcome, start);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ZooKeeperConfig;
    use crate::coordination::memory::MemoryConnector;
    use crate::coordination::ZnodeError;
    use serde_json::json;

    fn gateway() -> NodeGateway {
        let connections = ConnectionManager::new(
            Arc::new(MemoryConnector::new()),
            ZooKeeperConfig::default(),
        );
        NodeGateway::new(Arc::new(connections))
    }

    #[tokio::test]
    async fn test_exists_missing_is_absence() {
        let gw = gateway();
        assert_eq!(gw.exists("/missing").await.unwrap(), None);
        assert_eq!(
            gw.get_data("/missing").await.unwrap_err(),
            ZnodeError::NoSuchNode("/missing".into())
        );
    }

    #[tokio::test]
    async fn test_create_then_read_structured() {
        let gw = gateway();
        let payload = Payload::Structured(json!({"retries": 3}));
        let created = gw.create("/app/config", &payload, NodeKind::PERSISTENT).await.unwrap();
        assert_eq!(created, "/app/config");

        let node = gw.get_data("/app/config").await.unwrap();
        assert_eq!(node.data, Decoded::Structured(json!({"retries": 3})));
        assert_eq!(node.stat.version, 0);
        assert_eq!(node.stat.data_length as usize, br#"{"retries":3}"#.len());
    }

    #[tokio::test]
    async fn test_paths_are_normalized() {
        let gw = gateway();
        let created = gw
            .create("relative/node", &Payload::Text("x".into()), NodeKind::PERSISTENT)
            .await
            .unwrap();
        assert_eq!(created, "/relative/node");
        assert!(gw.exists("relative/node").await.unwrap().is_some());
        assert_eq!(gw.list_children("relative").await.unwrap(), vec!["node".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_path_rejected_before_connecting() {
        let gw = gateway();
        let err = gw.exists("/a//b").await.unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
        assert!(!gw.connections.is_connected());
    }

    #[tokio::test]
    async fn test_sequential_create_returns_suffixed_path() {
        let gw = gateway();
        let kind = NodeKind::new(false, true);
        let first = gw.create("/jobs/task-", &Payload::Absent, kind).await.unwrap();
        let second = gw.create("/jobs/task-", &Payload::Absent, kind).await.unwrap();

        let suffix = |p: &str| p.trim_start_matches("/jobs/task-").parse::<u64>().unwrap();
        assert!(first.starts_with("/jobs/task-"));
        assert!(suffix(&second) > suffix(&first));
    }

    #[tokio::test]
    async fn test_sequential_create_under_parent_slash() {
        let gw = gateway();
        let kind = NodeKind::new(false, true);
        let first = gw.create("jobs/", &Payload::Absent, kind).await.unwrap();
        let second = gw.create("/jobs/", &Payload::Absent, kind).await.unwrap();

        assert_eq!(first, "/jobs/0000000000");
        assert_eq!(second, "/jobs/0000000001");
        assert_eq!(gw.list_children("/jobs").await.unwrap().len(), 2);

        let err = gw
            .create("/jobs/", &Payload::Absent, NodeKind::PERSISTENT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let gw = gateway();
        gw.create("/dup", &Payload::Absent, NodeKind::PERSISTENT).await.unwrap();
        let err = gw
            .create("/dup", &Payload::Absent, NodeKind::PERSISTENT)
            .await
            .unwrap_err();
        assert_eq!(err, ZnodeError::NodeAlreadyExists("/dup".into()));
    }

    #[tokio::test]
    async fn test_list_root_children() {
        let gw = gateway();
        assert!(gw.list_children("/").await.unwrap().is_empty());

        gw.create("/a", &Payload::Absent, NodeKind::PERSISTENT).await.unwrap();
        gw.create("/b", &Payload::Absent, NodeKind::PERSISTENT).await.unwrap();

        let mut children = gw.list_children("/").await.unwrap();
        children.sort();
        assert_eq!(children, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_set_data_and_binary_payload() {
        let gw = gateway();
        gw.create("/blob", &Payload::Absent, NodeKind::PERSISTENT).await.unwrap();

        let stat = gw
            .set_data("/blob", &Payload::Bytes(vec![0xde, 0xad, 0xbe, 0xef]))
            .await
            .unwrap();
        assert_eq!(stat.version, 1);
        assert_eq!(stat.data_length, 4);

        let node = gw.get_data("/blob").await.unwrap();
        assert!(node.data.is_binary());
        assert_eq!(node.data.base64().as_deref(), Some("3q2+7w=="));

        let err = gw.set_data("/nope", &Payload::Absent).await.unwrap_err();
        assert_eq!(err.kind(), "NoSuchNode");
    }

    #[tokio::test]
    async fn test_delete_recursive_and_not_empty() {
        let gw = gateway();
        gw.create("/tree/leaf", &Payload::Absent, NodeKind::PERSISTENT).await.unwrap();

        assert_eq!(gw.delete("/tree", false).await.unwrap_err().kind(), "NotEmpty");
        gw.delete("/tree", true).await.unwrap();
        assert_eq!(gw.exists("/tree").await.unwrap(), None);
        assert_eq!(gw.delete("/tree", true).await.unwrap_err().kind(), "NoSuchNode");
    }
}
