//! chaser - Main entry point
//!
//! Serves a page showing a randomly chosen song biased toward the target
//! artist and adjacent genres, tagged with a chaser affinity label and a
//! playable video when one can be found, plus a live audio-level
//! visualization over SSE.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chaser::affinity::AffinityCache;
use chaser::catalog::CatalogClient;
use chaser::config::{Config, TomlConfig};
use chaser::video::VideoResolver;
use chaser::AppState;

/// Command-line arguments for chaser
#[derive(Parser, Debug)]
#[command(name = "chaser")]
#[command(about = "Random song page with chaser affinity tagging and live audio visualization")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CHASER_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(short, long, env = "CHASER_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the affinity cache file
    #[arg(long, env = "CHASER_CACHE")]
    cache: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chaser=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification immediately after tracing init
    info!(
        "Starting chaser v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_path = args.config.clone().unwrap_or_else(TomlConfig::default_path);
    let toml = TomlConfig::load(&toml_path)?;
    let config = Arc::new(Config::resolve(&toml, args.port, args.cache)?);

    let catalog = Arc::new(CatalogClient::new(
        config.client_id.clone(),
        config.client_secret.clone(),
        config.target_artist.clone(),
    )?);
    let resolver = Arc::new(VideoResolver::new(config.target_artist.clone())?);

    // Create the affinity cache if absent; a failed generation only degrades
    // ADJACENT detection, it never stops the server from starting
    let cache = match AffinityCache::generate(
        &config.cache_path,
        catalog.as_ref(),
        &config.target_artist,
    )
    .await
    {
        Ok(_) => AffinityCache::load(&config.cache_path, &config.target_artist)?,
        Err(e) => {
            warn!(error = %e, "affinity cache generation failed, running with sentinel-only cache");
            AffinityCache::sentinel_only(&config.target_artist)
        }
    };
    info!(entries = cache.len(), "affinity cache ready");

    let state = AppState::new(config.clone(), catalog, resolver, Arc::new(cache));
    let app = chaser::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Listening on http://{}", addr);

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
