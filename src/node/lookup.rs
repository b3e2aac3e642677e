//! Lookup engine.
//!
//! `find_successor` answers locally when the successor covers the target and otherwise
//! forwards to the closest reachable preceding node. Forwarding failures repair the
//! successor list and retry; every attempt spends one hop of the `FAIL_TIMES` budget.

use std::collections::HashSet;

use super::service::ChordNode;
use crate::config::FAIL_TIMES;
use crate::error::{ChordError, Result};
use crate::ring::{Edge, Identifier, between};

impl ChordNode {
    /// Resolves the node responsible for `target` with a fresh hop budget.
    pub async fn lookup(&self, target: Identifier) -> Result<Edge> {
        self.find_successor(target, 0).await
    }

    /// Resolves the node responsible for `target`, continuing a chain that has already
    /// used `hops` hops.
    pub async fn find_successor(&self, target: Identifier, mut hops: u32) -> Result<Edge> {
        loop {
            hops += 1;
            if hops >= FAIL_TIMES {
                tracing::warn!("Lookup of {:?} exceeded {} hops", target, FAIL_TIMES);
                return Err(ChordError::LookupFailed { target, hops });
            }

            self.fix_successors().await?;
            let successor = self.successor().await;

            if self.is_self(&successor) || target == self.local.id {
                return Ok(self.local.clone());
            }
            if between(&self.local.id, &target, &successor.id, true) {
                return Ok(successor);
            }

            let Some(next) = self.closest_preceding_node(&target).await else {
                tracing::debug!("No reachable node precedes {:?}, waiting", target);
                tokio::time::sleep(self.config.lookup_retry_delay()).await;
                continue;
            };

            match self
                .client
                .find_successor(&next.address, target, hops)
                .await
            {
                Ok(edge) => return Ok(edge),
                Err(e) if e.is_connectivity() => {
                    tracing::warn!("Forwarding lookup to {} failed: {}", next, e);
                    tokio::time::sleep(self.config.lookup_retry_delay()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Highest reachable finger strictly between this node and `target`, falling back
    /// to the first reachable entry of the successor list.
    pub(super) async fn closest_preceding_node(&self, target: &Identifier) -> Option<Edge> {
        let fingers = self.fingers.read().await.clone();
        let mut unreachable: HashSet<String> = HashSet::new();

        for finger in fingers.iter().rev().flatten() {
            if self.is_self(finger)
                || unreachable.contains(&finger.address)
                || !between(&self.local.id, &finger.id, target, false)
            {
                continue;
            }
            if self.client.ping(&finger.address).await {
                return Some(finger.clone());
            }
            unreachable.insert(finger.address.clone());
        }

        for successor in self.successor_list().await {
            if self.is_self(&successor) || unreachable.contains(&successor.address) {
                continue;
            }
            if self.client.ping(&successor.address).await {
                return Some(successor);
            }
            unreachable.insert(successor.address);
        }

        None
    }

    /// Repairs the successor list when its head is unreachable: the first live entry is
    /// promoted and the rest of the list is refreshed from it.
    ///
    /// Fails with `NoLiveSuccessor` when the whole list is unreachable.
    pub(super) async fn fix_successors(&self) -> Result<()> {
        let list = self.successor_list().await;
        if self.is_self(&list[0]) {
            return Ok(());
        }

        let mut live_index = None;
        for (i, edge) in list.iter().enumerate() {
            if self.is_self(edge) || self.client.ping(&edge.address).await {
                live_index = Some(i);
                break;
            }
        }

        let Some(live_index) = live_index else {
            tracing::error!("{}: every successor is unreachable", self.local.address);
            return Err(ChordError::NoLiveSuccessor);
        };
        if live_index == 0 {
            return Ok(());
        }

        let promoted = list[live_index].clone();
        tracing::info!(
            "{}: successor {} unreachable, promoting {}",
            self.local.address,
            list[0],
            promoted
        );

        let tail = if self.is_self(&promoted) {
            Vec::new()
        } else {
            match self.client.get_successor_list(&promoted.address).await {
                Ok(remote) => remote,
                Err(e) => {
                    tracing::warn!("Could not refresh successor list from {}: {}", promoted, e);
                    list[live_index + 1..].to_vec()
                }
            }
        };
        let chain = self.successor_chain(promoted, tail);

        let mut successors = self.successors.write().await;
        // Someone else already replaced the head while we were probing.
        if successors[0] == list[0] {
            *successors = chain;
        }
        Ok(())
    }

    /// Makes `successor` the head of the list and pulls the rest of the list from it.
    pub(super) async fn refresh_successors(&self, successor: Edge) -> Result<()> {
        if self.is_self(&successor) {
            self.install_successors(successor, Vec::new()).await;
            return Ok(());
        }

        let tail = self.client.get_successor_list(&successor.address).await?;
        self.install_successors(successor, tail).await;
        Ok(())
    }
}
