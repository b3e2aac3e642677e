use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};

use super::types::{FingerEntry, NodeSnapshot};
use crate::config::RingConfig;
use crate::error::Result;
use crate::ring::{Edge, KvMap, M};
use crate::rpc::client::RpcClient;

/// State of one ring member.
///
/// Each logical sub-table has its own lock. Whenever both stores are touched in one
/// operation the replica store (`data_pre`) is locked before the primary store (`data`).
/// No lock is ever held across an outbound RPC.
pub struct ChordNode {
    pub local: Edge,
    pub(super) config: RingConfig,
    pub(super) client: RpcClient,

    /// `successors[0]` is the immediate successor; the rest is the fallback chain.
    pub(super) successors: RwLock<Vec<Edge>>,
    pub(super) predecessor: RwLock<Option<Edge>>,
    /// `fingers[i - 1]` approximates the successor of `jump(id, i)`.
    pub(super) fingers: RwLock<Vec<Option<Edge>>>,

    /// Keys this node owns.
    pub(super) data: Mutex<KvMap>,
    /// Mirror of the predecessor's primary store.
    pub(super) data_pre: Mutex<KvMap>,

    live: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl ChordNode {
    /// Initializes a node for `address` with empty stores. The node is not part of any
    /// ring until `create` or `join` succeeds.
    pub fn new(address: impl Into<String>, config: RingConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let local = Edge::new(address);
        let client = RpcClient::new(&config)?;
        let (shutdown, _) = watch::channel(false);

        tracing::info!("Initialized node {} (id={})", local.address, local.id);

        Ok(Arc::new(Self {
            successors: RwLock::new(vec![local.clone(); config.successor_list_len]),
            predecessor: RwLock::new(None),
            fingers: RwLock::new(vec![None; M]),
            data: Mutex::new(KvMap::new()),
            data_pre: Mutex::new(KvMap::new()),
            live: AtomicBool::new(false),
            shutdown,
            local,
            config,
            client,
        }))
    }

    pub fn address(&self) -> &str {
        &self.local.address
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    pub(super) fn set_live(&self, live: bool) {
        self.live.store(live, Ordering::SeqCst);
    }

    pub(super) fn is_self(&self, edge: &Edge) -> bool {
        edge.is(&self.local)
    }

    /// Clears the liveness flag and closes the inbound listener.
    pub(super) fn shut_down(&self) {
        self.set_live(false);
        self.shutdown.send_replace(true);
    }

    /// Resolves once the node has quit (gracefully or not).
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|stopped| *stopped).await;
    }

    /// Sleeps for `period`, returning `false` early if the node shuts down meanwhile.
    pub(super) async fn pause(&self, period: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(period) => self.is_live(),
            _ = self.wait_for_shutdown() => false,
        }
    }

    pub async fn successor(&self) -> Edge {
        self.successors.read().await[0].clone()
    }

    pub async fn successor_list(&self) -> Vec<Edge> {
        self.successors.read().await.clone()
    }

    pub async fn predecessor(&self) -> Option<Edge> {
        self.predecessor.read().await.clone()
    }

    pub async fn finger(&self, index: usize) -> Option<Edge> {
        self.fingers.read().await[index - 1].clone()
    }

    pub async fn primary_store(&self) -> KvMap {
        self.data.lock().await.clone()
    }

    pub async fn replica_store(&self) -> KvMap {
        self.data_pre.lock().await.clone()
    }

    /// Builds a successor list: `head` followed by `tail`, truncated or padded (with
    /// `head`) to the configured length.
    pub(super) fn successor_chain(&self, head: Edge, tail: Vec<Edge>) -> Vec<Edge> {
        let len = self.config.successor_list_len;
        let mut list = Vec::with_capacity(len);
        list.push(head.clone());
        list.extend(tail.into_iter().take(len - 1));
        list.resize(len, head);
        list
    }

    pub(super) async fn install_successors(&self, head: Edge, tail: Vec<Edge>) {
        let list = self.successor_chain(head, tail);
        *self.successors.write().await = list;
    }

    /// Diagnostic state dump.
    pub async fn snapshot(&self) -> NodeSnapshot {
        let fingers = {
            let table = self.fingers.read().await;
            let mut entries: Vec<FingerEntry> = Vec::new();
            for (i, finger) in table.iter().enumerate() {
                if let Some(edge) = finger
                    && entries.last().map(|e| &e.edge) != Some(edge)
                {
                    entries.push(FingerEntry {
                        index: i + 1,
                        edge: edge.clone(),
                    });
                }
            }
            entries
        };

        NodeSnapshot {
            address: self.local.address.clone(),
            id: self.local.id,
            live: self.is_live(),
            predecessor: self.predecessor().await,
            successors: self.successor_list().await,
            fingers,
            data: self.primary_store().await,
            data_pre: self.replica_store().await,
        }
    }
}
