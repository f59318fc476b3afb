//! chunkfetch Server Binary
//!
//! Serves synthesized chunks over TCP.

use std::sync::Arc;

use chunkfetch::{Config, Server, SyntheticSource};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// chunkfetch Server
#[derive(Parser, Debug)]
#[command(name = "chunkfetch-server")]
#[command(about = "Point-to-point chunk retrieval server")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Close connections idle for this long (milliseconds, 0 = never)
    #[arg(short = 't', long, default_value = "30000")]
    idle_timeout_ms: u64,

    /// Largest accepted frame payload in bytes
    #[arg(short = 'f', long, default_value = "16777216")]
    max_frame_size: u32,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chunkfetch=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("chunkfetch server v{}", chunkfetch::VERSION);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.idle_timeout_ms)
        .max_frame_size(args.max_frame_size)
        .build();

    let server = match Server::bind(config, Arc::new(SyntheticSource)) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
