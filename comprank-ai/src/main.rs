//! comprank-ai - Company similarity ranking service
//!
//! Accepts a target company description and a deal table export, rates every
//! deal's description against the target one row per tick, and serves the
//! rows sorted most-similar first.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use comprank_common::config::{self, TomlConfig, ROOT_FOLDER_ENV};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use comprank_ai::config::ServiceConfig;
use comprank_ai::services::{ChatCompletionClient, SimilarityRater};
use comprank_ai::AppState;

/// Command-line arguments for comprank-ai
#[derive(Parser, Debug)]
#[command(name = "comprank-ai")]
#[command(about = "Company similarity ranking service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config.toml)
    #[arg(short, long, env = "COMPRANK_PORT")]
    port: Option<u16>,

    /// Folder holding the job database
    #[arg(short, long)]
    root_folder: Option<String>,

    /// Path to config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = match &args.config {
        Some(path) => TomlConfig::load(path)?,
        None => TomlConfig::load_default()?,
    };

    // Initialize tracing; RUST_LOG wins over the configured level
    let default_filter = toml_config
        .log_level
        .clone()
        .unwrap_or_else(|| "comprank_ai=info,tower_http=info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting comprank-ai v{}", env!("CARGO_PKG_VERSION"));

    let service_config = ServiceConfig::resolve(&toml_config, args.port)?;

    // Root folder: CLI → ENV → TOML → default
    let root_folder =
        config::resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml_config);
    let db_path = config::ensure_root_folder(&root_folder)?;
    info!("Database: {}", db_path.display());

    let db_pool = comprank_ai::db::init_database_pool(&db_path)
        .await
        .context("Failed to open job database")?;

    match comprank_ai::db::jobs::load_job(&db_pool).await {
        Ok(Some(job)) => info!(
            state = ?job.state(),
            cursor = job.progress.cursor,
            total = job.progress.total,
            "Resuming persisted job"
        ),
        Ok(None) => info!("No persisted job; starting idle"),
        Err(e) => warn!("Persisted job could not be read: {}", e),
    }

    let client = ChatCompletionClient::new(
        service_config.api_base_url.clone(),
        service_config.api_key.clone(),
        service_config.requests_per_minute,
    )
    .context("Failed to build rating client")?;
    info!(
        base_url = %service_config.api_base_url,
        model = %service_config.model,
        requests_per_minute = service_config.requests_per_minute,
        "Rating client ready"
    );

    let rater = SimilarityRater::new(Arc::new(client), service_config.model.clone())
        .with_retry_backoff(service_config.retry_backoff);

    let state =
        AppState::new(db_pool, rater).with_password_sha256(service_config.password_sha256.clone());
    let app = comprank_ai::build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], service_config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
