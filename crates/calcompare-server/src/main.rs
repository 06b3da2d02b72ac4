//! calcompare API server - Main Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;

use calcompare_common::init_logging;
use calcompare_config::ConfigLoader;
use calcompare_server::{start_server, AppState};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Log level, overriding the configuration file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Listener address, overriding the configuration file
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    ConfigLoader::apply_cli_overrides(&mut config, args.log_level, args.bind)?;

    init_logging(&config.logging.to_logging_config())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %config.server.bind_address,
        "Starting calcompare API"
    );

    let state = AppState::from_config(&config)?;
    start_server(state, &config.server.bind_address, config.server.request_timeout()).await
}
