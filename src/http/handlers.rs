//! Znode REST handlers.
//!
//! Reads follow a two-step contract: an existence probe decides 404 before
//! data or children are fetched. A node deleted between the two calls still
//! yields 404, because the fetch's `NoSuchNode` maps to 404 as well.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::coordination::{NodeKind, ZnodeError, ZnodeResult};
use crate::gateway::{path, Payload};
use crate::http::error::ApiError;
use crate::http::models::{
    CreateParams, DeleteParams, NodeChildrenResponse, NodeCreateResponse, NodeDataRequest,
    NodeDataResponse, NodeDeleteResponse, NodeUpdateResponse, ViewParams,
};
use crate::http::server::AppState;

/// Write request body: raw bytes or the JSON envelope.
enum WriteBody {
    Raw(Vec<u8>),
    Json(NodeDataRequest),
}

fn is_octet_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().starts_with("application/octet-stream"))
        .unwrap_or(false)
}

fn parse_body(headers: &HeaderMap, body: Bytes) -> ZnodeResult<WriteBody> {
    if is_octet_stream(headers) {
        return Ok(WriteBody::Raw(body.to_vec()));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(WriteBody::Json(NodeDataRequest::default()));
    }
    serde_json::from_slice(&body)
        .map(WriteBody::Json)
        .map_err(|e| ZnodeError::InvalidInput(format!("malformed request body: {}", e)))
}

fn query<T>(query: Result<Query<T>, QueryRejection>) -> ZnodeResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ZnodeError::InvalidInput(e.body_text()))
}

/// GET /znodes/v1
pub async fn list_root(
    State(state): State<AppState>,
) -> Result<Json<NodeChildrenResponse>, ApiError> {
    let children = state
        .gateway
        .list_children("/")
        .await
        .map_err(|e| state.error(e, "getting root nodes"))?;
    Ok(Json(NodeChildrenResponse::new("/".to_string(), children)))
}

/// GET /znodes/v1/{path}
pub async fn get_node(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(params): Query<ViewParams>,
) -> Result<Response, ApiError> {
    let context = "getting node";
    let path = path::resolve(&raw).map_err(|e| state.error(e, context))?;

    let stat = state
        .gateway
        .exists(&path)
        .await
        .map_err(|e| state.error(e, context))?;
    if stat.is_none() {
        return Err(state.error(ZnodeError::NoSuchNode(path), context));
    }

    if params.view.as_deref() == Some("children") {
        let children = state
            .gateway
            .list_children(&path)
            .await
            .map_err(|e| state.error(e, context))?;
        return Ok(Json(NodeChildrenResponse::new(path, children)).into_response());
    }

    let node = state
        .gateway
        .get_data(&path)
        .await
        .map_err(|e| state.error(e, context))?;
    Ok(Json(NodeDataResponse::from(node)).into_response())
}

/// HEAD /znodes/v1/{path}
pub async fn head_node(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
    let context = "checking node";
    let path = path::resolve(&raw).map_err(|e| state.error(e, context))?;
    match state.gateway.exists(&path).await {
        Ok(Some(_)) => Ok(StatusCode::OK),
        Ok(None) => Ok(StatusCode::NOT_FOUND),
        Err(e) => Err(state.error(e, context)),
    }
}

/// POST /znodes/v1/{path}
pub async fn create_node(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    params: Result<Query<CreateParams>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<NodeCreateResponse>), ApiError> {
    let context = "creating node";
    let params = query(params).map_err(|e| state.error(e, context))?;

    let (payload, kind) = match parse_body(&headers, body).map_err(|e| state.error(e, context))? {
        WriteBody::Raw(bytes) => (
            Payload::Bytes(bytes),
            NodeKind::new(params.ephemeral, params.sequence),
        ),
        WriteBody::Json(request) => {
            let kind = NodeKind::new(
                request.ephemeral || params.ephemeral,
                request.sequence || params.sequence,
            );
            let payload = request.into_payload().map_err(|e| state.error(e, context))?;
            (payload, kind)
        }
    };

    let created = state
        .gateway
        .create(&raw, &payload, kind)
        .await
        .map_err(|e| state.error(e, context))?;

    Ok((
        StatusCode::CREATED,
        Json(NodeCreateResponse {
            path: created,
            success: true,
        }),
    ))
}

/// PUT /znodes/v1/{path}
pub async fn update_node(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<NodeUpdateResponse>, ApiError> {
    let context = "updating node";
    let path = path::resolve(&raw).map_err(|e| state.error(e, context))?;

    let payload = match parse_body(&headers, body).map_err(|e| state.error(e, context))? {
        WriteBody::Raw(bytes) => Payload::Bytes(bytes),
        WriteBody::Json(request) => request.into_payload().map_err(|e| state.error(e, context))?,
    };

    let stat = state
        .gateway
        .set_data(&path, &payload)
        .await
        .map_err(|e| state.error(e, context))?;

    Ok(Json(NodeUpdateResponse {
        path,
        success: true,
        stat,
    }))
}

/// DELETE /znodes/v1/{path}
pub async fn delete_node(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<NodeDeleteResponse>, ApiError> {
    let context = "deleting node";
    let params = query(params).map_err(|e| state.error(e, context))?;
    let path = path::resolve(&raw).map_err(|e| state.error(e, context))?;

    state
        .gateway
        .delete(&path, params.recursive)
        .await
        .map_err(|e| state.error(e, context))?;

    Ok(Json(NodeDeleteResponse { path, success: true }))
}
