use serde::{Deserialize, Serialize};

use crate::ring::{Edge, Identifier, KvMap};

/// A run of identical fingers starting at `index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerEntry {
    pub index: usize,
    pub edge: Edge,
}

/// Point-in-time view of a node, returned by `/api/dump`.
///
/// Each field is read under its own lock, so the snapshot as a whole is not atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub address: String,
    pub id: Identifier,
    pub live: bool,
    pub predecessor: Option<Edge>,
    pub successors: Vec<Edge>,
    pub fingers: Vec<FingerEntry>,
    pub data: KvMap,
    pub data_pre: KvMap,
}
