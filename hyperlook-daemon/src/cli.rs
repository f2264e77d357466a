//! CLI argument definitions for hyperlook-daemon.
//!
//! Uses `clap` v4 derive macros. Every override flag takes precedence over
//! the config file and `HYPERLOOK_*` environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use hyperlook_core::config::HyperlookConfig;

/// Hyperlook proposal latency exporter.
///
/// Polls a log search backend for Hyperledger Fabric peer logs, classifies
/// proposal-processing windows and exposes their durations as Prometheus gauges.
#[derive(Parser, Debug)]
#[command(name = "hyperlook-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to hyperlook.toml. Defaults and environment variables are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Address to expose metrics on, as `host:port` or `:port`.
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Seconds between search backend polls.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Search backend URL.
    #[arg(long)]
    pub search_url: Option<String>,

    /// Kubernetes namespace of the peer.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Container name of the peer.
    #[arg(long)]
    pub container: Option<String>,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Poll once, print the analysis report as JSON and exit.
    #[arg(long, conflicts_with = "validate")]
    pub once: bool,
}

impl DaemonCli {
    /// Build the effective configuration: defaults -> file -> env -> CLI.
    ///
    /// Validation runs once, after every layer is applied.
    pub async fn resolve_config(&self) -> Result<HyperlookConfig> {
        let mut config = match &self.config {
            Some(path) => HyperlookConfig::from_file(path)
                .await
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => HyperlookConfig::default(),
        };
        config.apply_env_overrides();
        self.apply_overrides(&mut config)?;
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// Apply command-line overrides on top of a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `--listen-address` cannot be parsed.
    pub fn apply_overrides(&self, config: &mut HyperlookConfig) -> Result<()> {
        if let Some(level) = &self.log_level {
            config.general.log_level.clone_from(level);
        }
        if let Some(format) = &self.log_format {
            config.general.log_format.clone_from(format);
        }
        if let Some(address) = &self.listen_address {
            let (host, port) = parse_listen_address(address)?;
            config.metrics.listen_addr = host;
            config.metrics.port = port;
        }
        if let Some(interval) = self.interval {
            config.poller.interval_secs = interval;
        }
        if let Some(url) = &self.search_url {
            config.search.url.clone_from(url);
        }
        if let Some(namespace) = &self.namespace {
            config.search.namespace.clone_from(namespace);
        }
        if let Some(container) = &self.container {
            config.search.container.clone_from(container);
        }
        Ok(())
    }
}

/// Split `host:port` (or `:port`, meaning all interfaces) into its parts.
pub fn parse_listen_address(address: &str) -> Result<(String, u16)> {
    let (host, port) = address
        .rsplit_once(':')
        .with_context(|| format!("listen address '{address}' must be host:port or :port"))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid port in listen address '{address}'"))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok((host.to_owned(), port))
}
