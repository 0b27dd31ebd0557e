//! Room Player (jamroom-rp) - Main entry point
//!
//! Shared listening-room playback service: one ordered queue played through
//! one live session, with real-time state updates fanned out to observers
//! over SSE.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jamroom_rp::config::Config;
use jamroom_rp::resolver::{HttpResolver, SongResolver};
use jamroom_rp::transport::{ClockTransport, Transport};
use jamroom_rp::{api, db, Room};

/// Command-line arguments for jamroom-rp
#[derive(Parser, Debug)]
#[command(name = "jamroom-rp")]
#[command(about = "Room player service for Jamroom")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "JAMROOM_PORT")]
    port: Option<u16>,

    /// SQLite database path
    #[arg(short, long, env = "JAMROOM_DB")]
    database: Option<PathBuf>,

    /// Base URL of the song resolver service
    #[arg(long, env = "JAMROOM_RESOLVER_URL")]
    resolver_url: Option<String>,

    /// Transport target the room streams into
    #[arg(long, env = "JAMROOM_TRANSPORT_TARGET")]
    transport_target: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jamroom_rp=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Merge CLI/env with the optional config file
    let args = Args::parse();
    let file = Config::load_file().context("Failed to load config file")?;
    let config = Config::resolve(
        args.port,
        args.database,
        args.resolver_url,
        args.transport_target,
        file,
    );

    info!("Starting Jamroom Room Player on port {}", config.port);
    info!("Database: {}", config.db_path.display());
    info!("Resolver: {}", config.resolver_url);

    // Open the queue store
    let db_pool = db::connect(&config.db_path)
        .await
        .context("Failed to open room database")?;

    // External collaborators
    let resolver: Arc<dyn SongResolver> = Arc::new(
        HttpResolver::new(
            config.resolver_url.clone(),
            Duration::from_secs(config.resolver_timeout_secs),
        )
        .context("Failed to build resolver client")?,
    );

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let transport: Arc<dyn Transport> = Arc::new(ClockTransport::new(event_tx));

    // Bring up the room
    let room = Room::start(
        db_pool,
        resolver,
        transport,
        event_rx,
        config.transport_target.clone(),
    )
    .await
    .context("Failed to start room")?;
    info!("Room initialized");

    // Build the application router
    let ctx = api::AppContext {
        room,
        port: config.port,
    };
    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
