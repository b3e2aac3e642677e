use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::handlers::*;
use super::protocol::*;
use crate::error::Result;
use crate::node::ChordNode;

pub fn router(node: Arc<ChordNode>) -> Router {
    Router::new()
        .route(ENDPOINT_PING, get(handle_ping))
        .route(ENDPOINT_FIND_SUCCESSOR, post(handle_find_successor))
        .route(ENDPOINT_NOTIFY, post(handle_notify))
        .route(ENDPOINT_PREDECESSOR, get(handle_predecessor))
        .route(ENDPOINT_SUCCESSORS, get(handle_successors))
        .route(ENDPOINT_SET_SUCCESSOR, post(handle_set_successor))
        .route(ENDPOINT_SET_PREDECESSOR, post(handle_set_predecessor))
        .route(ENDPOINT_MOVE_KEY_RANGE, post(handle_move_key_range))
        .route(ENDPOINT_PULL_REPLICA, post(handle_pull_replica))
        .route(ENDPOINT_QUIT_HANDOFF, post(handle_quit_handoff))
        .route(ENDPOINT_PUT_VALUE, post(handle_put_value))
        .route(ENDPOINT_GET_VALUE, post(handle_get_value))
        .route(ENDPOINT_DELETE_VALUE, post(handle_delete_value))
        .route(ENDPOINT_PUT_REPLICA, post(handle_put_replica))
        .route(ENDPOINT_PUT_REPLICA_BATCH, post(handle_put_replica_batch))
        .route(ENDPOINT_DELETE_REPLICA, post(handle_delete_replica))
        .route(ENDPOINT_API_PUT, post(handle_api_put))
        .route(ENDPOINT_API_GET, post(handle_api_get))
        .route(ENDPOINT_API_DELETE, post(handle_api_delete))
        .route(ENDPOINT_API_DUMP, get(handle_api_dump))
        .layer(Extension(node))
}

/// Serves `node` on an already bound listener until the node quits.
pub async fn serve(node: Arc<ChordNode>, listener: TcpListener) -> Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!("HTTP server listening on {}", addr);

    let app = router(node.clone());
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { node.wait_for_shutdown().await })
        .await?;

    tracing::info!("HTTP server on {} stopped", addr);
    Ok(())
}

/// Runs `serve` on a background task.
pub fn spawn(node: Arc<ChordNode>, listener: TcpListener) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = serve(node, listener).await {
            tracing::error!("HTTP server failed: {}", e);
        }
    })
}
