//! blockfs Server Binary
//!
//! Opens the backing store and serves it over TCP.

use std::sync::Arc;

use blockfs::network::Server;
use blockfs::{Config, FileSystem};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// blockfs Server
#[derive(Parser, Debug)]
#[command(name = "blockfs-server")]
#[command(about = "Flat block-chained file store served over TCP")]
#[command(version)]
struct Args {
    /// Backing store file
    #[arg(short, long, default_value = "./disk.dat")]
    disk: String,

    /// Backing store size in bytes
    #[arg(short = 's', long, default_value = "1280")]
    total_size: u64,

    /// Block size in bytes
    #[arg(short, long, default_value = "128")]
    block_size: usize,

    /// Entry table slots
    #[arg(long, default_value = "5")]
    max_files: usize,

    /// Blocks in the store, metadata included
    #[arg(long, default_value = "10")]
    max_blocks: usize,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:12345")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blockfs=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("blockfs Server v{}", blockfs::VERSION);
    tracing::info!("Backing store: {}", args.disk);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .disk_path(&args.disk)
        .total_size(args.total_size)
        .block_size(args.block_size)
        .max_files(args.max_files)
        .max_blocks(args.max_blocks)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .build();

    let fs = match FileSystem::open(&config) {
        Ok(fs) => Arc::new(fs),
        Err(e) => {
            tracing::error!("Failed to open file system: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "File system ready: {} files, {} free blocks",
        fs.file_count(),
        fs.free_blocks()
    );

    let server = match Server::bind(config, Arc::clone(&fs)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    drop(server);
    match Arc::try_unwrap(fs) {
        Ok(fs) => {
            if let Err(e) = fs.close() {
                tracing::error!("Failed to close file system: {}", e);
            }
        }
        Err(_) => tracing::warn!("File system still shared at exit; skipping close"),
    }

    tracing::info!("Server stopped");
}
