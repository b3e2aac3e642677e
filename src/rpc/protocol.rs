//! Ring Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) exchanged between nodes
//! (ring maintenance, storage, replication) and with clients.
//!
//! All payloads are JSON over HTTP. Edges and key-value maps always travel by value.

use serde::{Deserialize, Serialize};

use crate::ring::{Edge, Identifier, KvMap};

// --- Ring maintenance endpoints ---

/// Liveness probe.
pub const ENDPOINT_PING: &str = "/ping";
/// Resolve the node responsible for an identifier (forwarded hop by hop).
pub const ENDPOINT_FIND_SUCCESSOR: &str = "/chord/find_successor";
/// Propose the caller as the receiver's predecessor.
pub const ENDPOINT_NOTIFY: &str = "/chord/notify";
pub const ENDPOINT_PREDECESSOR: &str = "/chord/predecessor";
pub const ENDPOINT_SUCCESSORS: &str = "/chord/successors";
pub const ENDPOINT_SET_SUCCESSOR: &str = "/chord/set_successor";
pub const ENDPOINT_SET_PREDECESSOR: &str = "/chord/set_predecessor";
/// Hand the key range a joining node now owns over to it.
pub const ENDPOINT_MOVE_KEY_RANGE: &str = "/chord/move_key_range";
/// Bulk copy of the primary or replica store.
pub const ENDPOINT_PULL_REPLICA: &str = "/chord/pull_replica";
/// Data handoff from a node leaving the ring.
pub const ENDPOINT_QUIT_HANDOFF: &str = "/chord/quit_handoff";

// --- Storage endpoints (act on the receiver's local stores only) ---

pub const ENDPOINT_PUT_VALUE: &str = "/kv/put";
pub const ENDPOINT_GET_VALUE: &str = "/kv/get";
pub const ENDPOINT_DELETE_VALUE: &str = "/kv/delete";
pub const ENDPOINT_PUT_REPLICA: &str = "/kv/replica/put";
pub const ENDPOINT_PUT_REPLICA_BATCH: &str = "/kv/replica/put_batch";
pub const ENDPOINT_DELETE_REPLICA: &str = "/kv/replica/delete";

// --- Client-facing endpoints (routed through the ring) ---

pub const ENDPOINT_API_PUT: &str = "/api/put";
pub const ENDPOINT_API_GET: &str = "/api/get";
pub const ENDPOINT_API_DELETE: &str = "/api/delete";
pub const ENDPOINT_API_DUMP: &str = "/api/dump";

// --- Data Transfer Objects ---

/// A lookup in flight.
///
/// `hops` is incremented by every node that handles the request; the chain is abandoned
/// once it reaches `FAIL_TIMES`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FindSuccessorRequest {
    pub target: Identifier,
    pub hops: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredecessorResponse {
    pub predecessor: Option<Edge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessorListResponse {
    pub successors: Vec<Edge>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyRequest {
    pub key: String,
}

/// `value` is `None` (with status 404) when the key is absent.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub value: Option<String>,
}

/// Generic acknowledgment. For deletes, `success` reports whether the key existed.
#[derive(Debug, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveKeyRangeRequest {
    /// Identifier of the joining node.
    pub id: Identifier,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PullReplicaRequest {
    /// `true` pulls the replica store, `false` the primary store.
    pub replica: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KvMapResponse {
    pub entries: KvMap,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicaBatchRequest {
    pub entries: KvMap,
}

/// Everything a departing node owns or mirrors.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuitHandoffRequest {
    pub data: KvMap,
    pub replica: KvMap,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub id: Identifier,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
