//! Command line interface definition

use clap::Parser;
use slowrepo_config::parse_duration;
use std::path::PathBuf;
use std::time::Duration;

/// slowrepo - deliberately slow chart repository server
#[derive(Parser)]
#[command(name = "slowrepo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deliberately slow chart repository server")]
#[command(long_about = None)]
pub struct Cli {
    /// Address to listen on, e.g. ":8080" or "127.0.0.1:8080"
    #[arg(long, alias = "listenAddr", value_name = "ADDR")]
    pub listen_addr: Option<String>,

    /// Maximum number of index.yaml requests served at once
    #[arg(long, alias = "maxIndexConcurrency", value_name = "N")]
    pub max_index_concurrency: Option<usize>,

    /// Delay applied to every admitted index.yaml request, e.g. "500ms"
    #[arg(long, alias = "simulateIndexDuration", value_name = "DURATION", value_parser = parse_cli_duration)]
    pub simulate_index_duration: Option<Duration>,

    /// Directory served under /charts
    #[arg(long, value_name = "DIR")]
    pub charts_dir: Option<PathBuf>,

    /// How long shutdown waits for in-flight requests
    #[arg(long, value_name = "DURATION", value_parser = parse_cli_duration)]
    pub shutdown_grace: Option<Duration>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_cli_duration(value: &str) -> Result<Duration, String> {
    parse_duration(value).map_err(|e| e.to_string())
}
