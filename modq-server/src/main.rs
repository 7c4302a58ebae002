//! modq-server - Moderation queue service
//!
//! Accepts proposed edits to artist, album and track records, collects
//! moderator votes, and applies or rejects each edit once voting closes.
//! A background sweeper resolves modifications whose voting period ran out.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use modq_common::config::{resolve_config, ConfigOverrides, TomlConfig};
use modq_server::engine::spawn_sweeper;
use modq_server::{build_router, AppState};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for modq-server
///
/// Each value can also come from a `MODQ_*` environment variable or the
/// config file; the command line wins.
#[derive(Parser, Debug)]
#[command(name = "modq-server")]
#[command(about = "Moderation queue for shared music metadata")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/modq/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database path
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<String>,

    /// Seconds after submission when a modification is resolved by majority
    #[arg(long)]
    voting_period_secs: Option<u64>,

    /// Same-direction votes that close a modification early
    #[arg(long)]
    unanimity_threshold: Option<i64>,

    /// Seconds between background sweeps
    #[arg(long)]
    sweep_interval_secs: Option<u64>,

    /// Modifications per listing page
    #[arg(long)]
    page_size: Option<i64>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database: self.database.clone(),
            bind: self.bind.clone(),
            voting_period_secs: self.voting_period_secs,
            unanimity_threshold: self.unanimity_threshold,
            sweep_interval_secs: self.sweep_interval_secs,
            page_size: self.page_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modq_server=info,modq_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting modq-server v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let file = TomlConfig::load_optional(args.config.as_deref())
        .context("Failed to load config file")?;
    let config = resolve_config(&args.overrides(), &file).context("Invalid configuration")?;

    info!("Database: {}", config.database_path.display());
    info!(
        "Voting period: {:?}, unanimity threshold: {}",
        config.engine.voting_period, config.engine.unanimity_threshold
    );

    let pool = modq_server::db::init_database(&config.database_path)
        .await
        .context("Failed to open database")?;
    info!("✓ Database ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(pool.clone(), config.engine.clone(), shutdown_rx);

    let state = AppState::new(pool.clone(), config.engine.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("modq-server listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Stop the sweeper between sweeps, never in the middle of a resolution
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper.await {
        error!("Sweeper task ended abnormally: {}", e);
    }

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
