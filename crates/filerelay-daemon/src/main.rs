//! filerelay daemon - runs the configured polling triggers
//!
//! Each trigger watches one remote folder and copies every matching file
//! into a local inbox directory, acknowledging it on the server once the
//! copy and its resumption token are safely on disk.
//!
//! # Architecture
//!
//! All triggers share one `TransportOrchestrator`, so two triggers on the
//! same folder never poll concurrently. Workers are stopped through a
//! `CancellationToken` that is cancelled on SIGTERM or SIGINT.

mod inbox;
mod state;
mod worker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use filerelay_core::config::Config;
use filerelay_core::usecases::TransportOrchestrator;
use filerelay_transport::backend_from_config;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use state::TokenStore;

#[derive(Debug, Parser)]
#[command(name = "filerelayd", version, about = "filerelay trigger daemon")]
struct Args {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Loads and validates the configuration; the daemon refuses to start on
/// any validation error or when no trigger is configured.
fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        Config::load(path)?
    } else {
        warn!(config_path = %path.display(), "Configuration file not found, using defaults");
        Config::default()
    };

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        anyhow::bail!("Invalid configuration: {}", details.join("; "));
    }
    if config.triggers.is_empty() {
        anyhow::bail!("No triggers configured in {}", path.display());
    }
    Ok(config)
}

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }
}

// ============================================================================
// Graceful shutdown signal handler
// ============================================================================

/// Waits for SIGTERM or SIGINT and cancels `token`
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }

    token.cancel();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = load_config(&config_path)?;

    init_tracing(&config);
    info!(
        config_path = %config_path.display(),
        transport = %config.transport.kind,
        server = %config.transport.server_address,
        triggers = config.triggers.len(),
        "Starting filerelay daemon"
    );

    let store = Arc::new(
        TokenStore::load(&config.daemon.state_file)
            .await
            .context("Failed to open trigger state")?,
    );
    info!(state_file = %store.path().display(), "Loaded trigger state");

    let orchestrator = Arc::new(TransportOrchestrator::new(
        backend_from_config(&config.transport),
        config.transport.root_folder.clone(),
        config.scratch_area(),
    ));

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    worker::run_all(&config.triggers, orchestrator, store, shutdown).await;

    info!("filerelay daemon shut down gracefully");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
