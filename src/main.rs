//! Butler - voice butler daemon
//!
//! Listens for MQTT commands and a push button, and speaks through one speaker.

use anyhow::{Context, Result};
use butler::config::{config_path, Config};
use butler::orchestrator::{Adapters, Orchestrator};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML config (defaults to $CONFIG_FILE)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Audio output device, overriding the config
    #[arg(short, long)]
    device: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging; LOGGING takes precedence over --verbose
    let filter = EnvFilter::try_from_env("LOGGING").unwrap_or_else(|_| {
        EnvFilter::new(if args.verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🎩 Butler v{} starting...", env!("CARGO_PKG_VERSION"));

    let path = config_path(args.config);
    let mut config = Config::load(&path).context("Failed reading config")?;
    if let Some(device) = args.device {
        config.device = device;
    }

    let adapters = Adapters::from_config(&config)
        .await
        .context("Failed to set up devices")?;
    Orchestrator::new(&config, adapters).run().await?;
    Ok(())
}
