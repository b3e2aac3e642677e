//! RPC Layer Tests
//!
//! Drives a node through its HTTP surface, both with `RpcClient` and with plain
//! `reqwest` requests the way an external client would.
//!
//! ## Test Scopes
//! - **Client**: ping, forwarded lookups, bulk transfers, unreachable peers.
//! - **Client API**: `/api/*` status codes and payloads.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use tokio::net::TcpListener;

    use crate::config::RingConfig;
    use crate::error::ChordError;
    use crate::node::ChordNode;
    use crate::node::types::NodeSnapshot;
    use crate::ring::{KVPair, between, hash};
    use crate::rpc::client::RpcClient;
    use crate::rpc::protocol::*;
    use crate::rpc::server;

    fn test_config() -> RingConfig {
        RingConfig {
            stabilize_interval_ms: 40,
            fix_fingers_interval_ms: 20,
            check_predecessor_interval_ms: 40,
            rpc_attempts: 2,
            rpc_backoff_ms: 20,
            ..RingConfig::default()
        }
    }

    async fn spawn_node() -> Arc<ChordNode> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let node = ChordNode::new(address, test_config()).unwrap();
        server::spawn(node.clone(), listener);
        node
    }

    fn url(node: &ChordNode, endpoint: &str) -> String {
        format!("http://{}{}", node.address(), endpoint)
    }

    // ============================================================
    // CLIENT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_ping_live_and_dead_peer() {
        let node = spawn_node().await;
        let client = RpcClient::new(&test_config()).unwrap();

        assert!(client.ping(node.address()).await);

        node.create().await.unwrap();
        node.force_quit();
        // The listener closes once the shutdown signal is observed.
        let mut closed = false;
        for _ in 0..50 {
            if !client.ping(node.address()).await {
                closed = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(closed, "a force-quit node must stop answering pings");
    }

    #[tokio::test]
    async fn test_unreachable_peer_reports_connectivity_error() {
        let dead = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };
        let client = RpcClient::new(&test_config()).unwrap();

        let err = client.get_successor_list(&dead).await.unwrap_err();

        assert!(matches!(err, ChordError::Unreachable { .. }));
        assert!(err.is_connectivity());
    }

    #[tokio::test]
    async fn test_find_successor_on_singleton() {
        let node = spawn_node().await;
        node.create().await.unwrap();
        let client = RpcClient::new(&test_config()).unwrap();

        let edge = client
            .find_successor(node.address(), hash("whatever"), 0)
            .await
            .unwrap();

        assert_eq!(edge, node.local);
    }

    #[tokio::test]
    async fn test_hop_budget_exhausted_is_remote_error() {
        let node = spawn_node().await;
        node.create().await.unwrap();
        let client = RpcClient::new(&test_config()).unwrap();

        let err = client
            .find_successor(node.address(), hash("whatever"), 40)
            .await
            .unwrap_err();

        match err {
            ChordError::Remote { status, .. } => assert_eq!(status, 503),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_move_key_range_hands_over_interval() {
        // ARRANGE: a singleton holding some keys
        let node = spawn_node().await;
        node.create().await.unwrap();
        for i in 0..40 {
            node.store_value(KVPair::new(format!("k{}", i), "v")).await;
        }
        let joiner = hash("127.0.0.1:1");
        let replica_before = node.replica_store().await;
        let client = RpcClient::new(&test_config()).unwrap();

        // ACT
        let moved = client.move_key_range(node.address(), joiner).await.unwrap();

        // ASSERT: (self, joiner] moved out, the rest stayed
        let remaining = node.primary_store().await;
        assert_eq!(moved.len() + remaining.len(), 40);
        for key in moved.keys() {
            assert!(between(&node.local.id, &hash(key), &joiner, true));
        }
        for key in remaining.keys() {
            assert!(!between(&node.local.id, &hash(key), &joiner, true));
        }
        // The mirror is rebuilt by Notify, not by the move itself.
        assert_eq!(node.replica_store().await, replica_before);
    }

    #[tokio::test]
    async fn test_pull_replica_selects_store() {
        let node = spawn_node().await;
        node.store_value(KVPair::new("primary", "1")).await;
        node.store_replica(KVPair::new("mirrored", "2")).await;
        let client = RpcClient::new(&test_config()).unwrap();

        let primary = client.pull_replica(node.address(), false).await.unwrap();
        let replica = client.pull_replica(node.address(), true).await.unwrap();

        assert!(primary.contains_key("primary") && primary.len() == 1);
        assert!(replica.contains_key("mirrored") && replica.len() == 1);
    }

    #[tokio::test]
    async fn test_quit_handoff_merges_and_replaces() {
        let node = spawn_node().await;
        node.create().await.unwrap();
        node.store_value(KVPair::new("own", "1")).await;
        node.store_replica(KVPair::new("stale", "x")).await;
        let client = RpcClient::new(&test_config()).unwrap();

        let data = [("handed".to_string(), "2".to_string())].into_iter().collect();
        let replica = [("pre".to_string(), "3".to_string())].into_iter().collect();
        client
            .quit_handoff(node.address(), data, replica)
            .await
            .unwrap();

        let primary = node.primary_store().await;
        assert_eq!(primary.get("own").map(String::as_str), Some("1"));
        assert_eq!(primary.get("handed").map(String::as_str), Some("2"));
        let mirrored = node.replica_store().await;
        assert!(!mirrored.contains_key("stale"));
        assert_eq!(mirrored.get("pre").map(String::as_str), Some("3"));
    }

    // ============================================================
    // CLIENT API TESTS
    // ============================================================

    #[tokio::test]
    async fn test_api_put_get_delete() {
        let node = spawn_node().await;
        node.create().await.unwrap();
        let http = reqwest::Client::new();

        let put: AckResponse = http
            .post(url(&node, ENDPOINT_API_PUT))
            .json(&KVPair::new("color", "blue"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(put.success);

        let resp = http
            .post(url(&node, ENDPOINT_API_GET))
            .json(&KeyRequest {
                key: "color".to_string(),
            })
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let got: GetResponse = resp.json().await.unwrap();
        assert_eq!(got.value.as_deref(), Some("blue"));

        let deleted: AckResponse = http
            .post(url(&node, ENDPOINT_API_DELETE))
            .json(&KeyRequest {
                key: "color".to_string(),
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(deleted.success);

        let resp = http
            .post(url(&node, ENDPOINT_API_GET))
            .json(&KeyRequest {
                key: "color".to_string(),
            })
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_rejects_requests_outside_ring() {
        let node = spawn_node().await;
        let http = reqwest::Client::new();

        let resp = http
            .post(url(&node, ENDPOINT_API_PUT))
            .json(&KVPair::new("k", "v"))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::CONFLICT);
        let body: ErrorResponse = resp.json().await.unwrap();
        assert!(body.error.contains("not part of a ring"));
    }

    #[tokio::test]
    async fn test_api_dump() {
        let node = spawn_node().await;
        node.create().await.unwrap();
        node.put("dumped", "yes").await.unwrap();

        let snapshot: NodeSnapshot = reqwest::get(url(&node, ENDPOINT_API_DUMP))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(snapshot.address, node.address());
        assert!(snapshot.live);
        assert_eq!(snapshot.data.get("dumped").map(String::as_str), Some("yes"));
        assert_eq!(snapshot.data_pre.get("dumped").map(String::as_str), Some("yes"));
    }
}
