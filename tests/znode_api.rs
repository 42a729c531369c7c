//! End-to-end tests of the REST surface over a real socket.

mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{start_proxy, start_proxy_with};
use zk_rest_proxy::ProxyConfig;

#[tokio::test]
async fn test_create_then_read() {
    let proxy = start_proxy().await;

    let res = proxy
        .client
        .post(proxy.node("/app/config"))
        .json(&json!({"data": {"replicas": 3}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"path": "/app/config", "success": true}));

    let body: Value = proxy
        .client
        .get(proxy.node("/app/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["exists"], true);
    assert_eq!(body["data"], json!({"replicas": 3}));
    assert_eq!(body["data_is_binary"], false);
    assert_eq!(body["stat"]["version"], 0);
    assert_eq!(body["stat"]["ephemeral_owner"], 0);

    proxy.stop().await;
}

#[tokio::test]
async fn test_root_listing_and_children_view() {
    let proxy = start_proxy().await;

    for path in ["/services/a", "/services/b"] {
        let res = proxy.client.post(proxy.node(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let root: Value = proxy
        .client
        .get(proxy.node(""))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(root["path"], "/");
    assert!(root["children"]
        .as_array()
        .unwrap()
        .contains(&json!("services")));

    let mut children: Value = proxy
        .client
        .get(proxy.node("/services?view=children"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(children["count"], 2);
    let names = children["children"].as_array_mut().unwrap();
    names.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    assert_eq!(*names, vec![json!("a"), json!("b")]);

    proxy.stop().await;
}

#[tokio::test]
async fn test_sequential_nodes_get_increasing_suffixes() {
    let proxy = start_proxy().await;

    let mut created = Vec::new();
    for _ in 0..2 {
        let body: Value = proxy
            .client
            .post(proxy.node("/queue/item-"))
            .json(&json!({"data": "job", "sequence": true}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        created.push(body["path"].as_str().unwrap().to_string());
    }

    assert!(created[0].starts_with("/queue/item-"));
    assert_eq!(created[0].len(), "/queue/item-".len() + 10);
    assert!(created[0] < created[1]);

    proxy.stop().await;
}

#[tokio::test]
async fn test_head_reports_existence() {
    let proxy = start_proxy().await;

    let res = proxy.client.head(proxy.node("/ghost")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    proxy.client.post(proxy.node("/ghost")).send().await.unwrap();
    let res = proxy.client.head(proxy.node("/ghost")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    proxy.stop().await;
}

#[tokio::test]
async fn test_conflicts_and_not_found() {
    let proxy = start_proxy().await;

    let res = proxy.client.get(proxy.node("/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Node /missing not found");

    proxy.client.post(proxy.node("/dup")).send().await.unwrap();
    let res = proxy.client.post(proxy.node("/dup")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Node /dup already exists");

    let res = proxy
        .client
        .put(proxy.node("/missing"))
        .json(&json!({"data": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    proxy.stop().await;
}

#[tokio::test]
async fn test_update_bumps_version() {
    let proxy = start_proxy().await;

    proxy
        .client
        .post(proxy.node("/counter"))
        .json(&json!({"data": "one"}))
        .send()
        .await
        .unwrap();

    let res = proxy
        .client
        .put(proxy.node("/counter"))
        .json(&json!({"data": "two"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["stat"]["version"], 1);

    let body: Value = proxy
        .client
        .get(proxy.node("/counter"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"], "two");

    proxy.stop().await;
}

#[tokio::test]
async fn test_delete_requires_recursive_for_parents() {
    let proxy = start_proxy().await;

    proxy.client.post(proxy.node("/tree/leaf")).send().await.unwrap();

    let res = proxy.client.delete(proxy.node("/tree")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = proxy
        .client
        .delete(proxy.node("/tree?recursive=true"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"path": "/tree", "success": true}));

    let res = proxy.client.head(proxy.node("/tree/leaf")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    proxy.stop().await;
}

#[tokio::test]
async fn test_binary_payload_round_trip() {
    let proxy = start_proxy().await;

    let res = proxy
        .client
        .post(proxy.node("/blob"))
        .header("content-type", "application/octet-stream")
        .body(vec![0xffu8, 0xfe, 0x00])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = proxy
        .client
        .get(proxy.node("/blob"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["data_is_binary"], true);
    assert_eq!(body["data_base64"], "//4A");
    assert_eq!(body["stat"]["data_length"], 3);

    proxy.stop().await;
}

#[tokio::test]
async fn test_health_and_info() {
    let proxy = start_proxy().await;

    let body: Value = proxy
        .client
        .get(proxy.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "degraded");

    proxy.client.get(proxy.node("")).send().await.unwrap();
    let body: Value = proxy
        .client
        .get(proxy.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "ok", "zookeeper_connected": true}));

    let body: Value = proxy
        .client
        .get(proxy.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["name"], "ZooKeeper REST Proxy");

    proxy.stop().await;
}

#[tokio::test]
async fn test_api_key_required_when_enabled() {
    let mut config = ProxyConfig::default();
    config.security.api_key_enabled = true;
    config.security.api_key = "letmein".into();
    let proxy = start_proxy_with(config).await;

    let res = proxy.client.get(proxy.node("")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = proxy
        .client
        .get(proxy.node(""))
        .header("x-api-key", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = proxy
        .client
        .get(proxy.node(""))
        .header("x-api-key", "letmein")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));

    let res = proxy.client.get(proxy.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    proxy.stop().await;
}

#[tokio::test]
async fn test_sequential_create_on_parent_path() {
    let proxy = start_proxy().await;

    let res = proxy
        .client
        .post(proxy.node("/jobs/"))
        .json(&json!({"sequence": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["path"], "/jobs/0000000000");

    let res = proxy.client.post(proxy.node("/jobs/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    proxy.stop().await;
}
