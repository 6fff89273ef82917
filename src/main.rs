//! # CFP Handler — Custom Handler Process
//!
//! Serves change-feed, timer and HTTP trigger invocations forwarded by the
//! functions host.
//!
//! Usage:
//!   cfp-handler                          # Port from FUNCTIONS_CUSTOMHANDLER_PORT
//!   cfp-handler --port 7071              # Explicit port (local runs)
//!   cfp-handler --config handler.toml    # Load settings from a TOML file
//!   cfp-handler --no-visualizer          # Skip the visualization relay

use anyhow::Result;
use cfp_core::HandlerConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cfp-handler",
    version,
    about = "Custom handler for change-feed, timer and HTTP triggers"
)]
struct Cli {
    /// Port to listen on (overrides FUNCTIONS_CUSTOMHANDLER_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// TOML config file, applied before environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable the visualization relay
    #[arg(long)]
    no_visualizer: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> Result<HandlerConfig> {
    let mut config = match &cli.config {
        Some(path) => HandlerConfig::load_from(path)?,
        None => HandlerConfig::default(),
    };
    config.apply_env(|key| std::env::var(key).ok())?;

    if let Some(port) = cli.port {
        config.port = Some(port);
    }
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if cli.no_visualizer {
        config.visualizer.enabled = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "cfp_handler=debug,cfp_core=debug,cfp_gateway=debug,tower_http=debug"
    } else {
        "cfp_handler=info,cfp_core=info,cfp_gateway=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config = load_config(&cli)?;
    tracing::info!("⚡ CFP Handler v{}", env!("CARGO_PKG_VERSION"));

    cfp_gateway::start(config).await
}
