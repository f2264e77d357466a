//! Prometheus metrics HTTP server.
//!
//! Uses the built-in HTTP listener from `metrics-exporter-prometheus`.
//! Once installed, every `metrics::gauge!()` written by the analyzer's
//! `GaugeSink` is served on `listen_addr:port/metrics`.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Result, anyhow};
use metrics_exporter_prometheus::PrometheusBuilder;

use hyperlook_core::config::MetricsConfig;

/// Resolve the socket address the exporter binds to.
///
/// # Errors
///
/// Returns an error if `listen_addr` is not an IP address.
pub fn listen_socket(config: &MetricsConfig) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .listen_addr
        .parse()
        .map_err(|e| anyhow!("invalid metrics listen address '{}': {e}", config.listen_addr))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Install the global metrics recorder and start the HTTP listener.
///
/// Call once per process. Metric descriptions are registered right after.
///
/// # Errors
///
/// - The endpoint is not `/metrics`
/// - The listen address is invalid or the socket cannot be bound
/// - A global recorder is already installed
pub fn install_metrics_recorder(config: &MetricsConfig) -> Result<()> {
    if config.endpoint != "/metrics" {
        return Err(anyhow!(
            "unsupported metrics endpoint '{}': only '/metrics' is served",
            config.endpoint
        ));
    }

    let addr = listen_socket(config)?;
    if addr.ip().is_unspecified() {
        tracing::warn!(
            listen_addr = %addr,
            "metrics endpoint is exposed on all interfaces"
        );
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow!("failed to install metrics recorder: {e}"))?;

    hyperlook_core::metrics::describe_all();

    tracing::info!(listen_addr = %addr, "Prometheus metrics endpoint active");
    Ok(())
}
