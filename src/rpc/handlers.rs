use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::protocol::*;
use crate::error::{ChordError, Result};
use crate::node::ChordNode;
use crate::node::types::NodeSnapshot;
use crate::ring::{Edge, KVPair};

// ==========================================
// Ring maintenance
// ==========================================

pub async fn handle_ping(Extension(node): Extension<Arc<ChordNode>>) -> Json<PingResponse> {
    Json(PingResponse { id: node.local.id })
}

pub async fn handle_find_successor(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<FindSuccessorRequest>,
) -> Result<Json<Edge>> {
    let edge = node.find_successor(req.target, req.hops).await?;
    Ok(Json(edge))
}

pub async fn handle_notify(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(candidate): Json<Edge>,
) -> Result<Json<AckResponse>> {
    node.notify(candidate).await?;
    Ok(Json(AckResponse { success: true }))
}

pub async fn handle_predecessor(
    Extension(node): Extension<Arc<ChordNode>>,
) -> Json<PredecessorResponse> {
    Json(PredecessorResponse {
        predecessor: node.predecessor().await,
    })
}

pub async fn handle_successors(
    Extension(node): Extension<Arc<ChordNode>>,
) -> Json<SuccessorListResponse> {
    Json(SuccessorListResponse {
        successors: node.successor_list().await,
    })
}

pub async fn handle_set_successor(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(successor): Json<Edge>,
) -> Result<Json<AckResponse>> {
    node.set_successor(successor).await?;
    Ok(Json(AckResponse { success: true }))
}

pub async fn handle_set_predecessor(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(predecessor): Json<Edge>,
) -> Json<AckResponse> {
    node.set_predecessor(predecessor).await;
    Json(AckResponse { success: true })
}

pub async fn handle_move_key_range(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<MoveKeyRangeRequest>,
) -> Result<Json<KvMapResponse>> {
    let entries = node.move_key_range(req.id).await?;
    Ok(Json(KvMapResponse { entries }))
}

pub async fn handle_pull_replica(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<PullReplicaRequest>,
) -> Json<KvMapResponse> {
    Json(KvMapResponse {
        entries: node.store_contents(req.replica).await,
    })
}

pub async fn handle_quit_handoff(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<QuitHandoffRequest>,
) -> Result<Json<AckResponse>> {
    node.accept_handoff(req.data, req.replica).await?;
    Ok(Json(AckResponse { success: true }))
}

// ==========================================
// Local storage
// ==========================================

pub async fn handle_put_value(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(pair): Json<KVPair>,
) -> Json<AckResponse> {
    let success = node.store_value(pair).await;
    Json(AckResponse { success })
}

pub async fn handle_get_value(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<KeyRequest>,
) -> (StatusCode, Json<GetResponse>) {
    match node.value(&req.key).await {
        Some(value) => (StatusCode::OK, Json(GetResponse { value: Some(value) })),
        None => (StatusCode::NOT_FOUND, Json(GetResponse { value: None })),
    }
}

pub async fn handle_delete_value(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<KeyRequest>,
) -> Json<AckResponse> {
    let success = node.remove_value(&req.key).await;
    Json(AckResponse { success })
}

pub async fn handle_put_replica(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(pair): Json<KVPair>,
) -> Json<AckResponse> {
    node.store_replica(pair).await;
    Json(AckResponse { success: true })
}

pub async fn handle_put_replica_batch(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<ReplicaBatchRequest>,
) -> Json<AckResponse> {
    tracing::debug!("{}: mirroring {} keys", node.address(), req.entries.len());
    node.store_replica_batch(req.entries).await;
    Json(AckResponse { success: true })
}

pub async fn handle_delete_replica(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<KeyRequest>,
) -> Json<AckResponse> {
    node.remove_replica(&req.key).await;
    Json(AckResponse { success: true })
}

// ==========================================
// Client API
// ==========================================

pub async fn handle_api_put(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(pair): Json<KVPair>,
) -> Result<Json<AckResponse>> {
    if !node.is_live() {
        return Err(ChordError::NotInRing);
    }
    let success = node.put(&pair.key, &pair.value).await?;
    Ok(Json(AckResponse { success }))
}

pub async fn handle_api_get(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<KeyRequest>,
) -> Result<(StatusCode, Json<GetResponse>)> {
    if !node.is_live() {
        return Err(ChordError::NotInRing);
    }
    let response = match node.get(&req.key).await? {
        Some(value) => (StatusCode::OK, Json(GetResponse { value: Some(value) })),
        None => (StatusCode::NOT_FOUND, Json(GetResponse { value: None })),
    };
    Ok(response)
}

pub async fn handle_api_delete(
    Extension(node): Extension<Arc<ChordNode>>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<AckResponse>> {
    if !node.is_live() {
        return Err(ChordError::NotInRing);
    }
    let success = node.delete(&req.key).await?;
    Ok(Json(AckResponse { success }))
}

pub async fn handle_api_dump(Extension(node): Extension<Arc<ChordNode>>) -> Json<NodeSnapshot> {
    Json(node.snapshot().await)
}
