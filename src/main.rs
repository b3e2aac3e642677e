use std::path::PathBuf;
use std::time::Duration;

use chord_dht::config::RingConfig;
use chord_dht::node::ChordNode;
use chord_dht::rpc::server;
use clap::Parser;

/// Runs one member of a Chord ring.
#[derive(Parser, Debug)]
#[command(name = "chord-node", version, about = "Chord DHT node")]
struct Cli {
    /// Address to listen on (host:port). It is also the node's ring address.
    #[arg(short, long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// Address of any ring member to join. Without it a new ring is created.
    #[arg(short, long)]
    join: Option<String>,

    /// Optional YAML file with timing and retry settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            RingConfig::load(path)?
        }
        None => RingConfig::default(),
    };

    // 1. Listener first: peers call back into this node during join.
    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    let address = listener.local_addr()?.to_string();

    // 2. Node + HTTP server:
    let node = ChordNode::new(address, config)?;
    let server_handle = server::spawn(node.clone(), listener);

    // 3. Create or join:
    match &cli.join {
        Some(bootstrap) => node.join(bootstrap).await?,
        None => node.create().await?,
    }

    // 4. Spawn stats reporter:
    let stats_node = node.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));

        loop {
            interval.tick().await;
            if !stats_node.is_live() {
                break;
            }
            let snapshot = stats_node.snapshot().await;
            tracing::info!(
                "Node {} (id={}) keys={} replicas={}",
                snapshot.address,
                snapshot.id,
                snapshot.data.len(),
                snapshot.data_pre.len()
            );
            match &snapshot.predecessor {
                Some(predecessor) => tracing::info!("  - predecessor {}", predecessor),
                None => tracing::info!("  - predecessor unknown"),
            }
            for successor in &snapshot.successors {
                tracing::info!("  - successor {}", successor);
            }
            for finger in &snapshot.fingers {
                tracing::debug!("  - finger[{}] {}", finger.index, finger.edge);
            }
        }
    });

    tracing::info!("Press Ctrl+C to leave the ring");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            if let Err(e) = node.quit().await {
                tracing::error!("Quit did not complete cleanly: {}", e);
            }
        }
        _ = node.wait_for_shutdown() => {}
    }

    server_handle.await?;
    Ok(())
}
