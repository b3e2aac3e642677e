//! Key-value operations.
//!
//! The public `put`/`get`/`delete` route through the ring: resolve the owner with a
//! lookup, act on its primary store, then mirror the change into the replica store of
//! the owner's successor. The primary write and the replica write are separate calls, so
//! a concurrent reader of the replica may briefly see the old value.
//!
//! The `store_*`/`remove_*` methods act on this node's stores only and back the inbound
//! storage endpoints.

use std::time::Duration;

use super::service::ChordNode;
use crate::error::Result;
use crate::ring::{Edge, Identifier, KVPair, KvMap, hash};

impl ChordNode {
    pub async fn put(&self, key: &str, value: &str) -> Result<bool> {
        let pair = KVPair::new(key, value);
        let owner = self.lookup(hash(key)).await?;

        let stored = self.client.put_value(&owner.address, &pair).await?;
        let mirror = self.replica_holder(&owner).await?;
        self.client.put_replica(&mirror.address, &pair).await?;

        tracing::debug!("Put {} at {} (mirror {})", key, owner, mirror);
        Ok(stored)
    }

    /// Returns `Ok(None)` when the key is absent, and also when the owner stays
    /// unreachable for `get_attempts` attempts.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let target = hash(key);
        let mut delay_ms = self.config.rpc_backoff_ms;

        for attempt in 1..=self.config.get_attempts {
            match self.fetch(target, key).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!("Get {} attempt {} failed: {}", key, attempt, e);
                    if attempt < self.config.get_attempts {
                        let jitter = rand::random::<u64>() % 50;
                        tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                        delay_ms *= 2;
                    }
                }
            }
        }

        tracing::warn!("Get {}: owner unreachable, reporting not found", key);
        Ok(None)
    }

    async fn fetch(&self, target: Identifier, key: &str) -> Result<Option<String>> {
        let owner = self.lookup(target).await?;
        self.client.get_value(&owner.address, key).await
    }

    /// Returns whether the key existed.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let owner = self.lookup(hash(key)).await?;

        let removed = self.client.delete_value(&owner.address, key).await?;
        let mirror = self.replica_holder(&owner).await?;
        self.client.delete_replica(&mirror.address, key).await?;

        tracing::debug!("Delete {} at {} (found={})", key, owner, removed);
        Ok(removed)
    }

    /// The node mirroring `owner`'s primary store: its immediate successor.
    async fn replica_holder(&self, owner: &Edge) -> Result<Edge> {
        let successors = self.client.get_successor_list(&owner.address).await?;
        Ok(successors.into_iter().next().unwrap_or_else(|| owner.clone()))
    }

    pub async fn store_value(&self, pair: KVPair) -> bool {
        self.data.lock().await.insert(pair.key, pair.value);
        true
    }

    pub async fn value(&self, key: &str) -> Option<String> {
        self.data.lock().await.get(key).cloned()
    }

    pub async fn remove_value(&self, key: &str) -> bool {
        self.data.lock().await.remove(key).is_some()
    }

    pub async fn store_replica(&self, pair: KVPair) {
        self.data_pre.lock().await.insert(pair.key, pair.value);
    }

    pub async fn store_replica_batch(&self, entries: KvMap) {
        self.data_pre.lock().await.extend(entries);
    }

    pub async fn remove_replica(&self, key: &str) {
        self.data_pre.lock().await.remove(key);
    }

    /// Copy of the replica store (`replica == true`) or the primary store.
    pub async fn store_contents(&self, replica: bool) -> KvMap {
        if replica {
            self.replica_store().await
        } else {
            self.primary_store().await
        }
    }
}
