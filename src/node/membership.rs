//! Ring membership: create, join, quit.
//!
//! Join and quit are one-shot operations. A failed join leaves the node outside the
//! ring; a failed quit is not rolled back, the survivors' maintenance loops repair the
//! stale pointers it leaves behind.

use std::sync::Arc;

use super::service::ChordNode;
use crate::error::{ChordError, Result};
use crate::ring::{Edge, Identifier, KVPair, KvMap, between, hash};

impl ChordNode {
    /// Starts a new ring with this node as its only member.
    pub async fn create(self: &Arc<Self>) -> Result<()> {
        if self.is_live() {
            return Err(ChordError::AlreadyInRing);
        }

        self.install_successors(self.local.clone(), Vec::new()).await;
        *self.predecessor.write().await = Some(self.local.clone());
        self.set_live(true);
        self.start_maintenance();

        tracing::info!("{}: created a new ring", self.local.address);
        Ok(())
    }

    /// Joins the ring that `bootstrap` belongs to.
    ///
    /// Any failing step aborts the whole join; the caller retries from scratch.
    pub async fn join(self: &Arc<Self>, bootstrap: &str) -> Result<()> {
        if self.is_live() {
            return Err(ChordError::AlreadyInRing);
        }
        tracing::info!("{}: joining ring via {}", self.local.address, bootstrap);

        *self.predecessor.write().await = None;
        let successor = self
            .client
            .find_successor(bootstrap, self.local.id, 0)
            .await?;
        if self.is_self(&successor) {
            return Err(ChordError::AlreadyInRing);
        }

        let tail = self.client.get_successor_list(&successor.address).await?;
        // Our predecessor-to-be is the successor's current predecessor, so its mirror is
        // exactly what ours must hold.
        let replica = self.client.pull_replica(&successor.address, true).await?;
        let owned = self
            .client
            .move_key_range(&successor.address, self.local.id)
            .await?;

        // Commit before notifying: the successor mirrors our primary store once it
        // adopts us as its predecessor.
        self.install_successors(successor.clone(), tail).await;
        {
            let mut data_pre = self.data_pre.lock().await;
            let mut data = self.data.lock().await;
            *data_pre = replica;
            data.extend(owned.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if let Err(e) = self.client.notify(&successor.address, &self.local).await {
            tracing::error!("{}: join aborted, notify failed: {}", self.local.address, e);
            self.abort_join(&successor, owned).await;
            return Err(e);
        }

        self.set_live(true);
        self.start_maintenance();
        tracing::info!(
            "{}: joined ring, successor {} ({} keys taken over)",
            self.local.address,
            successor,
            owned.len()
        );
        Ok(())
    }

    /// Resets local state and hands the migrated keys back, best effort.
    async fn abort_join(&self, successor: &Edge, owned: KvMap) {
        self.install_successors(self.local.clone(), Vec::new()).await;
        *self.predecessor.write().await = None;
        {
            let mut data_pre = self.data_pre.lock().await;
            let mut data = self.data.lock().await;
            data_pre.clear();
            data.clear();
        }

        for (key, value) in owned {
            if let Err(e) = self
                .client
                .put_value(&successor.address, &KVPair { key, value })
                .await
            {
                tracing::warn!("Could not return key to {}: {}", successor, e);
            }
        }
    }

    /// Leaves the ring gracefully: hands all data to the successor and splices this node
    /// out between its predecessor and successor.
    ///
    /// Fails without side effects while the predecessor is still unknown, so the caller
    /// can retry once stabilization has caught up. Once the handoff has started the node
    /// stops serving requests whether or not the remaining steps succeed.
    pub async fn quit(&self) -> Result<()> {
        if !self.is_live() {
            return Err(ChordError::NotInRing);
        }

        if let Err(e) = self.fix_successors().await {
            tracing::warn!("{}: {}", self.local.address, e);
        }
        let successor = self.successor().await;
        if self.is_self(&successor) {
            self.shut_down();
            tracing::info!("{}: left the ring", self.local.address);
            return Ok(());
        }

        let predecessor = self.wait_for_predecessor().await?;
        let result = self.leave(successor, predecessor).await;
        self.shut_down();

        match &result {
            Ok(()) => tracing::info!("{}: left the ring", self.local.address),
            Err(e) => tracing::error!("{}: quit incomplete: {}", self.local.address, e),
        }
        result
    }

    async fn leave(&self, successor: Edge, predecessor: Edge) -> Result<()> {
        let (data, replica) = {
            let data_pre = self.data_pre.lock().await;
            let data = self.data.lock().await;
            (data.clone(), data_pre.clone())
        };

        self.client
            .quit_handoff(&successor.address, data, replica)
            .await?;
        self.client
            .set_successor(&predecessor.address, &successor)
            .await?;
        self.client
            .set_predecessor(&successor.address, &predecessor)
            .await?;
        Ok(())
    }

    /// Stops without any handoff, as if the process had crashed.
    pub fn force_quit(&self) {
        tracing::warn!("{}: force quit", self.local.address);
        self.shut_down();
    }

    /// Polls for a known predecessor for up to `join_wait_attempts` stabilize intervals.
    async fn wait_for_predecessor(&self) -> Result<Edge> {
        let mut waited = 0;
        loop {
            if let Some(predecessor) = self.predecessor().await {
                return Ok(predecessor);
            }
            if waited >= self.config.join_wait_attempts {
                return Err(ChordError::NoPredecessor);
            }
            waited += 1;
            tokio::time::sleep(self.config.stabilize_interval()).await;
        }
    }

    /// Removes and returns the keys a joining node with identifier `joiner` now owns:
    /// those hashing into `(predecessor, joiner]`.
    ///
    /// The replica store is left alone. It is rebuilt from the joiner's primary store
    /// when the joiner's Notify makes it this node's predecessor, so a join that aborts
    /// before that point leaves the mirror of the current predecessor intact.
    pub async fn move_key_range(&self, joiner: Identifier) -> Result<KvMap> {
        let predecessor = self.wait_for_predecessor().await?;

        let moved: KvMap = {
            let mut data = self.data.lock().await;
            let moved: KvMap = data
                .iter()
                .filter(|(key, _)| between(&predecessor.id, &hash(key), &joiner, true))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for key in moved.keys() {
                data.remove(key);
            }
            moved
        };

        tracing::info!(
            "{}: moved {} keys to joining node {:?}",
            self.local.address,
            moved.len(),
            joiner
        );
        Ok(moved)
    }

    /// Receives everything a departing predecessor held.
    pub async fn accept_handoff(&self, data: KvMap, replica: KvMap) -> Result<()> {
        {
            let mut data_pre = self.data_pre.lock().await;
            let mut primary = self.data.lock().await;
            primary.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
            *data_pre = replica;
        }
        tracing::info!(
            "{}: accepted {} keys from departing predecessor",
            self.local.address,
            data.len()
        );

        if data.is_empty() {
            return Ok(());
        }
        self.fix_successors().await?;
        let successor = self.successor().await;
        if !self.is_self(&successor)
            && let Err(e) = self.client.put_replica_batch(&successor.address, data).await
        {
            tracing::warn!("{}: could not mirror handed-off keys: {}", self.local.address, e);
        }
        Ok(())
    }

    /// Points the successor at `successor` and refreshes the rest of the list from it.
    pub async fn set_successor(&self, successor: Edge) -> Result<()> {
        tracing::info!("{}: successor set to {}", self.local.address, successor);
        let previous = self.successor_list().await;

        if let Err(e) = self.refresh_successors(successor.clone()).await {
            self.install_successors(successor, previous.into_iter().skip(1).collect())
                .await;
            return Err(e);
        }
        Ok(())
    }

    pub async fn set_predecessor(&self, predecessor: Edge) {
        tracing::info!("{}: predecessor set to {}", self.local.address, predecessor);
        *self.predecessor.write().await = Some(predecessor);
    }
}
