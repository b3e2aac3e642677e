//! Outbound RPC client.
//!
//! Every call dials with a bounded retry budget and exponential backoff. Only once the
//! budget is exhausted does a connectivity failure surface as `ChordError::Unreachable`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::protocol::*;
use crate::config::RingConfig;
use crate::error::{ChordError, Result};
use crate::ring::{Edge, Identifier, KVPair, KvMap};

const MAX_BACKOFF_MS: u64 = 1200;

#[derive(Clone)]
pub struct RpcClient {
    http_client: reqwest::Client,
    timeout: Duration,
    ping_timeout: Duration,
    attempts: usize,
    backoff_ms: u64,
}

impl RpcClient {
    pub fn new(config: &RingConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.rpc_timeout())
            .build()?;

        Ok(Self {
            http_client,
            timeout: config.rpc_timeout(),
            ping_timeout: config.ping_timeout(),
            attempts: config.rpc_attempts.max(1),
            backoff_ms: config.rpc_backoff_ms,
        })
    }

    /// Sends the request built by `build` until a response arrives or the dial budget is
    /// spent. `build` is called once per attempt, since a sent request is consumed.
    async fn send_with_retry<F>(&self, addr: &str, url: &str, build: F) -> Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut delay_ms = self.backoff_ms;

        for attempt in 0..self.attempts {
            match build().send().await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    tracing::debug!("{} attempt {} failed: {}", url, attempt + 1, e);
                    if attempt + 1 == self.attempts {
                        break;
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(MAX_BACKOFF_MS);
                }
            }
        }

        Err(ChordError::Unreachable {
            addr: addr.to_string(),
        })
    }

    async fn post_with_retry<T: Serialize>(
        &self,
        addr: &str,
        endpoint: &str,
        payload: &T,
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response> {
        let url = format!("http://{}{}", addr, endpoint);
        self.send_with_retry(addr, &url, || {
            let request = self.http_client.post(url.as_str()).json(payload);
            match timeout {
                Some(timeout) => request.timeout(timeout),
                None => request,
            }
        })
        .await
    }

    async fn get_with_retry(&self, addr: &str, endpoint: &str) -> Result<reqwest::Response> {
        let url = format!("http://{}{}", addr, endpoint);
        self.send_with_retry(addr, &url, || {
            self.http_client.get(url.as_str()).timeout(self.timeout)
        })
        .await
    }

    async fn decode<R: DeserializeOwned>(addr: &str, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            return Err(ChordError::Remote {
                addr: addr.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        addr: &str,
        endpoint: &str,
        payload: &T,
    ) -> Result<R> {
        let response = self
            .post_with_retry(addr, endpoint, payload, Some(self.timeout))
            .await?;
        Self::decode(addr, response).await
    }

    async fn get<R: DeserializeOwned>(&self, addr: &str, endpoint: &str) -> Result<R> {
        let response = self.get_with_retry(addr, endpoint).await?;
        Self::decode(addr, response).await
    }

    /// Single short probe; any failure means "not alive".
    pub async fn ping(&self, addr: &str) -> bool {
        let url = format!("http://{}{}", addr, ENDPOINT_PING);
        match self
            .http_client
            .get(url)
            .timeout(self.ping_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Forwards a lookup. A chain is bounded by its hop counter, not by a deadline, so
    /// only dialing is timed out here.
    pub async fn find_successor(&self, addr: &str, target: Identifier, hops: u32) -> Result<Edge> {
        let response = self
            .post_with_retry(
                addr,
                ENDPOINT_FIND_SUCCESSOR,
                &FindSuccessorRequest { target, hops },
                None,
            )
            .await?;
        Self::decode(addr, response).await
    }

    pub async fn notify(&self, addr: &str, candidate: &Edge) -> Result<()> {
        let _: AckResponse = self.post(addr, ENDPOINT_NOTIFY, candidate).await?;
        Ok(())
    }

    pub async fn get_predecessor(&self, addr: &str) -> Result<Option<Edge>> {
        let resp: PredecessorResponse = self.get(addr, ENDPOINT_PREDECESSOR).await?;
        Ok(resp.predecessor)
    }

    pub async fn get_successor_list(&self, addr: &str) -> Result<Vec<Edge>> {
        let resp: SuccessorListResponse = self.get(addr, ENDPOINT_SUCCESSORS).await?;
        Ok(resp.successors)
    }

    pub async fn set_successor(&self, addr: &str, successor: &Edge) -> Result<()> {
        let _: AckResponse = self.post(addr, ENDPOINT_SET_SUCCESSOR, successor).await?;
        Ok(())
    }

    pub async fn set_predecessor(&self, addr: &str, predecessor: &Edge) -> Result<()> {
        let _: AckResponse = self
            .post(addr, ENDPOINT_SET_PREDECESSOR, predecessor)
            .await?;
        Ok(())
    }

    pub async fn put_value(&self, addr: &str, pair: &KVPair) -> Result<bool> {
        let resp: AckResponse = self.post(addr, ENDPOINT_PUT_VALUE, pair).await?;
        Ok(resp.success)
    }

    pub async fn get_value(&self, addr: &str, key: &str) -> Result<Option<String>> {
        let response = self
            .post_with_retry(
                addr,
                ENDPOINT_GET_VALUE,
                &KeyRequest {
                    key: key.to_string(),
                },
                Some(self.timeout),
            )
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp: GetResponse = Self::decode(addr, response).await?;
        Ok(resp.value)
    }

    pub async fn delete_value(&self, addr: &str, key: &str) -> Result<bool> {
        let resp: AckResponse = self
            .post(
                addr,
                ENDPOINT_DELETE_VALUE,
                &KeyRequest {
                    key: key.to_string(),
                },
            )
            .await?;
        Ok(resp.success)
    }

    pub async fn put_replica(&self, addr: &str, pair: &KVPair) -> Result<()> {
        let _: AckResponse = self.post(addr, ENDPOINT_PUT_REPLICA, pair).await?;
        Ok(())
    }

    pub async fn put_replica_batch(&self, addr: &str, entries: KvMap) -> Result<()> {
        let _: AckResponse = self
            .post(
                addr,
                ENDPOINT_PUT_REPLICA_BATCH,
                &ReplicaBatchRequest { entries },
            )
            .await?;
        Ok(())
    }

    pub async fn delete_replica(&self, addr: &str, key: &str) -> Result<()> {
        let _: AckResponse = self
            .post(
                addr,
                ENDPOINT_DELETE_REPLICA,
                &KeyRequest {
                    key: key.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    /// The receiver may wait for its own predecessor before answering, so no deadline.
    pub async fn move_key_range(&self, addr: &str, id: Identifier) -> Result<KvMap> {
        let response = self
            .post_with_retry(addr, ENDPOINT_MOVE_KEY_RANGE, &MoveKeyRangeRequest { id }, None)
            .await?;
        let resp: KvMapResponse = Self::decode(addr, response).await?;
        Ok(resp.entries)
    }

    pub async fn pull_replica(&self, addr: &str, replica: bool) -> Result<KvMap> {
        let resp: KvMapResponse = self
            .post(addr, ENDPOINT_PULL_REPLICA, &PullReplicaRequest { replica })
            .await?;
        Ok(resp.entries)
    }

    pub async fn quit_handoff(&self, addr: &str, data: KvMap, replica: KvMap) -> Result<()> {
        let _: AckResponse = self
            .post(
                addr,
                ENDPOINT_QUIT_HANDOFF,
                &QuitHandoffRequest { data, replica },
            )
            .await?;
        Ok(())
    }
}
