//! Request and response bodies of the REST surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coordination::{NodeStat, ZnodeError, ZnodeResult};
use crate::gateway::{NodeData, Payload};

/// JSON body accepted by create (POST) and update (PUT).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NodeDataRequest {
    /// Structured or text data to store.
    pub data: Value,
    /// Raw bytes, base64 encoded. Exclusive with `data`.
    pub data_base64: Option<String>,
    /// Create an ephemeral node (create only).
    pub ephemeral: bool,
    /// Create a sequential node (create only).
    pub sequence: bool,
}

impl NodeDataRequest {
    pub fn into_payload(self) -> ZnodeResult<Payload> {
        match self.data_base64 {
            Some(_) if !self.data.is_null() => Err(ZnodeError::InvalidInput(
                "data and data_base64 are mutually exclusive".into(),
            )),
            Some(encoded) => Payload::from_base64(&encoded),
            None => Ok(Payload::from_json(self.data)),
        }
    }
}

/// Response for node data reads.
#[derive(Debug, Serialize)]
pub struct NodeDataResponse {
    pub path: String,
    pub exists: bool,
    pub data: Value,
    pub data_is_binary: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stat: Option<NodeStat>,
}

impl From<NodeData> for NodeDataResponse {
    fn from(node: NodeData) -> Self {
        Self {
            data: node.data.to_json(),
            data_is_binary: node.data.is_binary(),
            data_base64: node.data.base64(),
            path: node.path,
            exists: true,
            stat: Some(node.stat),
        }
    }
}

/// Response for children listings.
#[derive(Debug, Serialize)]
pub struct NodeChildrenResponse {
    pub path: String,
    pub children: Vec<String>,
    pub count: usize,
}

impl NodeChildrenResponse {
    pub fn new(path: String, children: Vec<String>) -> Self {
        Self {
            count: children.len(),
            path,
            children,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NodeCreateResponse {
    pub path: String,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct NodeUpdateResponse {
    pub path: String,
    pub success: bool,
    pub stat: NodeStat,
}

#[derive(Debug, Serialize)]
pub struct NodeDeleteResponse {
    pub path: String,
    pub success: bool,
}

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub zookeeper_connected: bool,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

/// Query parameters of `GET /znodes/v1/{path}`.
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub view: Option<String>,
}

/// Query parameters of `POST /znodes/v1/{path}` with a raw body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateParams {
    pub ephemeral: bool,
    pub sequence: bool,
}

/// Query parameters of `DELETE /znodes/v1/{path}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteParams {
    pub recursive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Decoded;
    use serde_json::json;

    fn stat() -> NodeStat {
        NodeStat {
            created: 1,
            modified: 2,
            version: 3,
            children_count: 0,
            ephemeral_owner: 0,
            data_length: 4,
        }
    }

    #[test]
    fn test_data_response_shape() {
        let response = NodeDataResponse::from(NodeData {
            path: "/a".into(),
            data: Decoded::Structured(json!({"k": "v"})),
            stat: stat(),
        });
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["path"], "/a");
        assert_eq!(value["exists"], true);
        assert_eq!(value["data"], json!({"k": "v"}));
        assert_eq!(value["data_is_binary"], false);
        assert!(value.get("data_base64").is_none());
        assert_eq!(value["stat"]["version"], 3);
        assert_eq!(value["stat"]["data_length"], 4);
    }

    #[test]
    fn test_binary_response_carries_base64() {
        let response = NodeDataResponse::from(NodeData {
            path: "/bin".into(),
            data: Decoded::Binary(vec![0xff]),
            stat: stat(),
        });
        assert!(response.data_is_binary);
        assert_eq!(response.data_base64.as_deref(), Some("/w=="));
        assert_eq!(response.data["binary"], true);
    }

    #[test]
    fn test_request_payload_mapping() {
        let req: NodeDataRequest = serde_json::from_str(r#"{"data": {"retries": 3}}"#).unwrap();
        assert_eq!(req.into_payload().unwrap(), Payload::Structured(json!({"retries": 3})));

        let req: NodeDataRequest = serde_json::from_str(r#"{"data": "plain"}"#).unwrap();
        assert_eq!(req.into_payload().unwrap(), Payload::Text("plain".into()));

        let req: NodeDataRequest = serde_json::from_str(r#"{"ephemeral": true}"#).unwrap();
        assert!(req.ephemeral);
        assert_eq!(req.into_payload().unwrap(), Payload::Absent);

        let req: NodeDataRequest = serde_json::from_str(r#"{"data_base64": "AQI="}"#).unwrap();
        assert_eq!(req.into_payload().unwrap(), Payload::Bytes(vec![1, 2]));

        let req: NodeDataRequest =
            serde_json::from_str(r#"{"data": 1, "data_base64": "AQI="}"#).unwrap();
        assert_eq!(req.into_payload().unwrap_err().kind(), "InvalidInput");
    }

    #[test]
    fn test_children_count() {
        let response = NodeChildrenResponse::new("/".into(), vec!["a".into(), "b".into()]);
        assert_eq!(response.count, 2);
    }
}
