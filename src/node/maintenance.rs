//! Background convergence loops.
//!
//! Three long-lived tasks per node, each running until the liveness flag clears:
//! - **stabilize**: repairs the successor list, adopts a closer successor if one joined,
//!   and notifies the successor about this node.
//! - **fix_fingers**: refreshes the finger table one index (or run of indices) at a time.
//! - **check_predecessor**: probes the predecessor and takes over its key range when it
//!   has failed.

use std::sync::Arc;

use super::service::ChordNode;
use crate::error::Result;
use crate::ring::{Edge, M, between, jump};

impl ChordNode {
    pub(super) fn start_maintenance(self: &Arc<Self>) {
        let _stabilize_handle = {
            let node = self.clone();
            tokio::spawn(async move {
                node.stabilize_loop().await;
            })
        };

        let _fix_fingers_handle = {
            let node = self.clone();
            tokio::spawn(async move {
                node.fix_fingers_loop().await;
            })
        };

        let _check_predecessor_handle = {
            let node = self.clone();
            tokio::spawn(async move {
                node.check_predecessor_loop().await;
            })
        };

        tracing::debug!("{}: maintenance tasks started", self.local.address);
    }

    async fn stabilize_loop(self: Arc<Self>) {
        while self.pause(self.config.stabilize_interval()).await {
            if let Err(e) = self.stabilize().await {
                tracing::warn!("{}: stabilize round failed: {}", self.local.address, e);
            }
        }
        tracing::debug!("{}: stabilize loop stopped", self.local.address);
    }

    /// One stabilization round.
    pub async fn stabilize(&self) -> Result<()> {
        self.fix_successors().await?;
        let mut successor = self.successor().await;

        let candidate = if self.is_self(&successor) {
            self.predecessor().await
        } else {
            self.client.get_predecessor(&successor.address).await?
        };

        if let Some(candidate) = candidate
            && between(&self.local.id, &candidate.id, &successor.id, false)
            && self.client.ping(&candidate.address).await
        {
            tracing::info!(
                "{}: successor {} -> {}",
                self.local.address,
                successor,
                candidate
            );
            successor = candidate;
        }

        if self.is_self(&successor) {
            self.install_successors(successor, Vec::new()).await;
            return self.notify(self.local.clone()).await;
        }

        self.refresh_successors(successor.clone()).await?;
        self.client.notify(&successor.address, &self.local).await
    }

    /// `candidate` believes it is this node's predecessor.
    ///
    /// Adopted when there is no predecessor yet or it lies strictly between the current
    /// predecessor and this node. A change of predecessor resynchronizes the replica store;
    /// if that pull fails the previous predecessor is restored, so the next Notify from
    /// the same candidate retries the whole adoption.
    pub async fn notify(&self, candidate: Edge) -> Result<()> {
        let previous = {
            let mut predecessor = self.predecessor.write().await;
            let adopt = match predecessor.as_ref() {
                None => true,
                Some(current) => between(&current.id, &candidate.id, &self.local.id, false),
            };
            if !adopt || predecessor.as_ref() == Some(&candidate) {
                return Ok(());
            }
            predecessor.replace(candidate.clone())
        };

        tracing::info!("{}: predecessor is now {}", self.local.address, candidate);
        if let Err(e) = self.sync_replica(&candidate).await {
            let mut predecessor = self.predecessor.write().await;
            if predecessor.as_ref() == Some(&candidate) {
                *predecessor = previous;
            }
            tracing::warn!(
                "{}: could not mirror {}, predecessor not adopted: {}",
                self.local.address,
                candidate,
                e
            );
            return Err(e);
        }
        Ok(())
    }

    /// Rebuilds the replica store from the predecessor's primary store.
    async fn sync_replica(&self, predecessor: &Edge) -> Result<()> {
        if self.is_self(predecessor) {
            let mut data_pre = self.data_pre.lock().await;
            let data = self.data.lock().await;
            *data_pre = data.clone();
            return Ok(());
        }

        let entries = self.client.pull_replica(&predecessor.address, false).await?;
        tracing::debug!(
            "{}: mirrored {} keys from {}",
            self.local.address,
            entries.len(),
            predecessor
        );
        *self.data_pre.lock().await = entries;
        Ok(())
    }

    async fn fix_fingers_loop(self: Arc<Self>) {
        let mut index = 1;

        while self.is_live() {
            if self.finger(1).await.as_ref() != Some(&self.successor().await) {
                index = 1;
            }

            let target = jump(&self.local.id, index);
            let mut found = None;
            for attempt in 1..=self.config.fix_finger_attempts {
                match self.lookup(target).await {
                    Ok(edge) => {
                        found = Some(edge);
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(
                            "{}: finger {} lookup attempt {} failed: {}",
                            self.local.address,
                            index,
                            attempt,
                            e
                        );
                        if !self.pause(self.config.fix_fingers_interval()).await {
                            return;
                        }
                    }
                }
            }

            let Some(edge) = found else {
                tracing::error!(
                    "{}: finger {} unresolved after {} attempts, fix_fingers stopped",
                    self.local.address,
                    index,
                    self.config.fix_finger_attempts
                );
                return;
            };

            // The same owner usually covers a run of consecutive finger targets.
            {
                let mut fingers = self.fingers.write().await;
                fingers[index - 1] = Some(edge.clone());
                index += 1;
                while index <= M && between(&self.local.id, &jump(&self.local.id, index), &edge.id, true)
                {
                    fingers[index - 1] = Some(edge.clone());
                    index += 1;
                }
            }
            if index > M {
                index = 1;
            }

            if !self.pause(self.config.fix_fingers_interval()).await {
                break;
            }
        }
        tracing::debug!("{}: fix_fingers loop stopped", self.local.address);
    }

    async fn check_predecessor_loop(self: Arc<Self>) {
        while self.pause(self.config.check_predecessor_interval()).await {
            if let Err(e) = self.check_predecessor().await {
                tracing::warn!("{}: predecessor check failed: {}", self.local.address, e);
            }
        }
        tracing::debug!("{}: check_predecessor loop stopped", self.local.address);
    }

    /// Probes the predecessor. When it has failed, its mirrored keys move into the
    /// primary store and are pushed on to the successor's replica store.
    pub async fn check_predecessor(&self) -> Result<()> {
        let Some(predecessor) = self.predecessor().await else {
            return Ok(());
        };
        if self.is_self(&predecessor) || self.client.ping(&predecessor.address).await {
            return Ok(());
        }

        {
            let mut current = self.predecessor.write().await;
            if current.as_ref() != Some(&predecessor) {
                return Ok(());
            }
            *current = None;
        }
        tracing::warn!(
            "{}: predecessor {} failed, taking over its keys",
            self.local.address,
            predecessor
        );

        let merged = {
            let mut data_pre = self.data_pre.lock().await;
            let mut data = self.data.lock().await;
            let merged = std::mem::take(&mut *data_pre);
            data.extend(merged.iter().map(|(k, v)| (k.clone(), v.clone())));
            merged
        };
        if merged.is_empty() {
            return Ok(());
        }
        tracing::info!("{}: took over {} keys", self.local.address, merged.len());

        self.fix_successors().await?;
        let successor = self.successor().await;
        if self.is_self(&successor) {
            return Ok(());
        }
        self.client.put_replica_batch(&successor.address, merged).await
    }
}
