//! Daemon orchestration -- assembly and lifecycle management.
//!
//! The [`Orchestrator`] loads configuration, installs the Prometheus
//! recorder, builds the analysis pipeline and keeps it running until
//! `SIGTERM` or `SIGINT` arrives.
//!
//! # Startup Order
//!
//! 1. Metrics recorder (so the first poll's gauges are captured)
//! 2. Analysis pipeline (first poll runs immediately)
//! 3. Uptime updater
//!
//! # Shutdown Order
//!
//! 1. Background tasks (cancellation token)
//! 2. Analysis pipeline (waits for an in-flight poll to be dropped)

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use hyperlook_analyzer::{
    AnalysisPipeline, AnalysisPipelineBuilder, AnalysisReport, GaugeSink, ProposalAnalyzer,
    SearchClient, poll_once,
};
use hyperlook_core::config::HyperlookConfig;
use hyperlook_core::metrics as m;
use hyperlook_core::pipeline::{HealthStatus, Pipeline};

use crate::metrics_server;

/// How often the main loop logs the pipeline's health.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);

/// How often the uptime gauge is refreshed.
const UPTIME_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// Health snapshot of the running daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Analysis pipeline health.
    pub status: HealthStatus,
    /// Seconds since the orchestrator was built.
    pub uptime_secs: u64,
    /// Polls that completed and were analyzed.
    pub polls_succeeded: u64,
    /// Polls that failed (fetch, decode or pattern compilation).
    pub polls_failed: u64,
    /// Whether at least one poll has finished, successfully or not.
    pub first_poll_done: bool,
}

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: HyperlookConfig,
    /// The polling pipeline.
    pipeline: AnalysisPipeline,
    /// Cancels background tasks owned by the orchestrator.
    shutdown: CancellationToken,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration from `config_path` and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated,
    /// or if the pipeline cannot be built.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = HyperlookConfig::load(config_path)
            .await
            .with_context(|| format!("failed to load config from {}", config_path.display()))?;
        Self::build_from_config(config)
    }

    /// Build from an already-loaded configuration.
    ///
    /// Installs the global metrics recorder when `[metrics] enabled = true`.
    pub fn build_from_config(config: HyperlookConfig) -> Result<Self> {
        config.validate().context("config validation failed")?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            record_build_info();
        }

        let pipeline = AnalysisPipelineBuilder::from_config(&config)
            .context("failed to create search client")?
            .build()
            .context("failed to build analysis pipeline")?;

        tracing::info!(
            url = %config.search.url,
            namespace = %config.search.namespace,
            container = %config.search.container,
            interval_secs = config.poller.interval_secs,
            "orchestrator initialized"
        );

        Ok(Self {
            config,
            pipeline,
            shutdown: CancellationToken::new(),
            start_time: Instant::now(),
        })
    }

    /// Start the pipeline and block until a shutdown signal is received.
    ///
    /// # Shutdown Triggers
    ///
    /// - `SIGTERM` (from systemd, Docker, or `kill`)
    /// - `SIGINT` (Ctrl+C)
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(wait_for_shutdown_signal()).await
    }

    /// Start the pipeline and block until `shutdown` resolves.
    ///
    /// The future yields the name of the trigger, used only for logging.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = Result<&'static str>>,
    {
        self.pipeline
            .start()
            .await
            .context("failed to start analysis pipeline")?;

        let uptime_task = self
            .config
            .metrics
            .enabled
            .then(|| spawn_uptime_updater(self.start_time, self.shutdown.clone()));

        tokio::pin!(shutdown);
        let mut health_tick = tokio::time::interval(HEALTH_LOG_INTERVAL);
        health_tick.tick().await;

        tracing::info!("entering main loop");
        let signal = loop {
            tokio::select! {
                signal = &mut shutdown => break signal,
                _ = health_tick.tick() => self.log_health().await,
            }
        };

        match &signal {
            Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
            Err(e) => tracing::error!(error = %e, "shutdown signal handling failed"),
        }

        self.shutdown.cancel();
        if let Some(task) = uptime_task {
            join_background(task, "uptime updater").await;
        }

        self.pipeline
            .stop()
            .await
            .context("failed to stop analysis pipeline")?;
        tracing::info!("hyperlook-daemon shut down");

        signal.map(|_| ())
    }

    /// Current health snapshot.
    pub async fn health(&self) -> DaemonHealth {
        let stats = self.pipeline.stats();
        DaemonHealth {
            status: self.pipeline.health_check().await,
            uptime_secs: self.start_time.elapsed().as_secs(),
            polls_succeeded: stats.succeeded(),
            polls_failed: stats.failed(),
            first_poll_done: stats.has_polled(),
        }
    }

    async fn log_health(&self) {
        let health = self.health().await;
        match &health.status {
            HealthStatus::Healthy if !health.first_poll_done => {
                tracing::debug!(uptime_secs = health.uptime_secs, "waiting for first poll")
            }
            HealthStatus::Healthy => tracing::debug!(
                uptime_secs = health.uptime_secs,
                polls_succeeded = health.polls_succeeded,
                "pipeline healthy"
            ),
            status => tracing::warn!(
                status = %status,
                polls_failed = health.polls_failed,
                "pipeline not healthy"
            ),
        }
    }

    /// Loaded configuration.
    pub fn config(&self) -> &HyperlookConfig {
        &self.config
    }
}

/// Poll the search backend once and return the analysis report.
///
/// Used by `--once`. Gauges are written to whatever recorder is installed,
/// which is none unless the caller installed one.
pub async fn run_once(config: &HyperlookConfig) -> Result<AnalysisReport> {
    let client = SearchClient::from_config(&config.search).context("failed to create search client")?;
    let analyzer = ProposalAnalyzer::new().context("failed to compile marker patterns")?;

    poll_once(&client, &analyzer, &GaugeSink)
        .await
        .with_context(|| format!("poll of {} failed", config.search.url))
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
pub async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Record the build info gauge (always 1, labelled with the version).
fn record_build_info() {
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Spawn a background task that periodically updates the uptime gauge.
/// Await a background task, logging a panic or cancellation instead of dropping it.
///
/// Returns `true` when the task finished normally.
async fn join_background(task: tokio::task::JoinHandle<()>, name: &'static str) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(task = name, error = %e, "background task ended abnormally");
            false
        }
    }
}

fn spawn_uptime_updater(
    start_time: Instant,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_UPDATE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
                _ = interval.tick() => {
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS)
                        .set(start_time.elapsed().as_secs() as f64);
                }
            }
        }
    })
}
