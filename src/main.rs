use clap::Parser;
use plaza_server::{RelayConfig, RelayServer};

/// Real-time presence relay for shared 3D spaces.
#[derive(Parser)]
#[command(name = "plaza", version)]
struct Cli {
    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind.
    #[arg(long)]
    port: Option<u16>,

    /// Outbound queue depth per client.
    #[arg(long)]
    send_queue: Option<usize>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::default();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(send_queue) = cli.send_queue {
        config.send_queue = send_queue;
    }

    tracing::info!("Starting plaza relay");

    // Start server
    let server = RelayServer::new(config);
    let (addr, serve_task) = server.listen().await.expect("Failed to start server");
    tracing::info!(addr = %addr, "Relay ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
    server
        .shutdown()
        .graceful_shutdown(vec![serve_task], None)
        .await;
}
