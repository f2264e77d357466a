use anyhow::Result;
use clap::Parser;

use hyperlook_daemon::cli::DaemonCli;
use hyperlook_daemon::logging::init_tracing;
use hyperlook_daemon::orchestrator::{Orchestrator, run_once};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    let config = cli.resolve_config().await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(());
    }

    init_tracing(&config.general)?;

    if cli.once {
        let report = run_once(&config).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hyperlook-daemon starting");
    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await
}
