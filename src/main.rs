//! Songlist caching proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  SONGLIST PROXY                  │
//!                        │                                                  │
//!   POST /songlist/...   │  ┌─────────┐    ┌──────────────┐   hit          │
//!   ─────────────────────┼─▶│  http   │───▶│ CacheService │──────┐         │
//!                        │  │ server  │    │ (coordinator)│      │         │
//!                        │  └─────────┘    └──────┬───────┘      │         │
//!                        │       ▲          miss / │ background   │         │
//!                        │       │         refresh ▼              │         │
//!                        │       │          ┌──────────────┐      │         │
//!                        │       │          │  in-flight   │      │         │
//!                        │       │          │  (1 per key) │      │         │
//!                        │       │          └──────┬───────┘      │         │
//!                        │       │                 ▼              │         │
//!                        │       │          ┌──────────────┐      │         │   Upstream
//!                        │       │          │   upstream   │◀─────┼─────────┼── (gzip JSON)
//!                        │       │          │    client    │      │         │
//!                        │       │          └──────┬───────┘      │         │
//!                        │       │                 ▼              │         │
//!                        │       │          ┌──────────────┐      │         │
//!                        │       │          │avatar patcher│      │         │
//!                        │       │          └──────┬───────┘      │         │
//!                        │       │                 ▼              ▼         │
//!   ◀────────────────────┼───────┴──────────── cache store ◀──────┘         │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use songlist_proxy::config::load_config;
use songlist_proxy::http::HttpServer;
use songlist_proxy::lifecycle::{signals, Shutdown};
use songlist_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "songlist-proxy")]
#[command(about = "Caching proxy for the songlist view endpoint", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "songlist-proxy starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.endpoint,
        uid = %config.songlist.uid,
        url = %config.songlist.url,
        default_avatar = %config.songlist.default_avatar,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
