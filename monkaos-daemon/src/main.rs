//! monkaos binary entry point.
//!
//! Usage:
//! ```bash
//! monkaos --config /etc/monkaos.toml --log-level debug
//! monkaos --check-config
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use monkaos::config::DEFAULT_CONFIG_PATH;
use monkaos::{logging, Config, Scheduler, TickLoop};
use monkaos_cluster::KubeCluster;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Chaos monkey for Kubernetes: periodically terminates random pods.
#[derive(Parser, Debug)]
#[command(name = "monkaos")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "MONKAOS_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, env = "MONKAOS_LOG", default_value = "info")]
    log_level: String,

    /// Load and validate the config, print it, and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log_level).context("Failed to initialize logging")?;

    let config = Config::load_or_default(&cli.config).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    tracing::info!("Configuration initialized with: {}", config.summary());

    if cli.check_config {
        return Ok(());
    }

    let cluster = KubeCluster::connect()
        .await
        .context("Failed to connect to the Kubernetes API server")?;

    let scheduler = Scheduler::new(Arc::new(cluster), &config);
    let mut tick_loop = TickLoop::new(scheduler, &config);

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl-C, shutting down");
                shutdown.cancel();
            }
        });
    }

    tick_loop.run(shutdown).await.context("Chaos loop stopped")?;
    Ok(())
}
