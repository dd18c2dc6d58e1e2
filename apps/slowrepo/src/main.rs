//! slowrepo - deliberately slow chart repository server
//!
//! Serves a fixed `index.yaml` behind an admission limit and a simulated
//! delay so chart clients can be tested against a slow, contended backend.

mod cli;
mod error;

use crate::cli::Cli;
use crate::error::CliError;
use clap::Parser;
use slowrepo_config::Config;
use slowrepo_server::RegistryServer;
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json, cli.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting slowrepo v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration with proper precedence:
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;

    // 2. Merge environment variables
    config.merge_env()?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli);
    config.validate()?;

    let server = RegistryServer::bind(&config).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    server.run(shutdown).await?;
    info!("Server stopped");
    Ok(())
}

fn apply_cli_config(config: &mut Config, cli: &Cli) {
    if let Some(addr) = &cli.listen_addr {
        config.server.listen_addr.clone_from(addr);
    }
    if let Some(limit) = cli.max_index_concurrency {
        config.server.max_index_concurrency = limit;
    }
    if let Some(delay) = cli.simulate_index_duration {
        config.server.simulate_index_duration = delay;
    }
    if let Some(dir) = &cli.charts_dir {
        config.server.charts_dir.clone_from(dir);
    }
    if let Some(grace) = cli.shutdown_grace {
        config.server.shutdown_grace = grace;
    }
}

/// First signal drains, second signal exits with status 1
async fn watch_signals(shutdown: CancellationToken) {
    if let Err(e) = wait_for_signal().await {
        error!(error = %CliError::from(e), "failed to install signal handler");
        return;
    }
    info!("Received shutdown signal, draining in-flight requests");
    shutdown.cancel();

    if wait_for_signal().await.is_ok() {
        warn!("Received second signal, exiting immediately");
        process::exit(1);
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "debug"
    } else {
        "info,slowrepo=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
