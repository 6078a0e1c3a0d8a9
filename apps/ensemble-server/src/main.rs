mod agents;
mod server;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "ensemble-server", about = "Ensemble agent host")]
struct Args {
    /// Path to the host configuration file.
    #[arg(long, default_value = "config/ensemble.yaml")]
    config: PathBuf,
    /// Listen address override.
    #[arg(long)]
    listen: Option<String>,
    /// Skip broker catalog registration at startup.
    #[arg(long)]
    skip_registration: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = ensemble_config::load_config(&args.config)
        .with_context(|| format!("load config from {} failed", args.config.display()))?;
    if let Some(listen) = args.listen {
        config.service.listen = listen;
    }

    let registry = agents::build_registry().context("build agent registry failed")?;
    server::run_server(config, registry, args.skip_registration).await
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
