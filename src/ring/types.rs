use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::id::{Identifier, hash};

/// Key-value map used for the primary and replica stores and for bulk transfers.
pub type KvMap = HashMap<String, String>;

/// Reference to a ring member.
///
/// An edge is a value: once a member fails, every copy of its edge simply becomes stale
/// and is replaced by the maintenance loops.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Edge {
    pub address: String,
    pub id: Identifier,
}

impl Edge {
    /// Builds the edge for `address`, deriving its identifier by hashing.
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let id = hash(&address);
        Self { address, id }
    }

    pub fn is(&self, other: &Edge) -> bool {
        self.address == other.address
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, &self.id.to_hex()[..8])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KVPair {
    pub key: String,
    pub value: String,
}

impl KVPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
