//! 폴링 파이프라인 -- 주기적으로 수집하고 분석합니다.
//!
//! [`AnalysisPipeline`]은 core의 [`Pipeline`](hyperlook_core::pipeline::Pipeline) trait을 구현하여
//! `hyperlook-daemon`에서 start/stop/health_check 생명주기로 관리됩니다.
//!
//! # 내부 아키텍처
//! ```text
//! interval tick -> SearchClient::fetch -> decode_hits -> ProposalAnalyzer::analyze -> MetricsSink
//! ```
//!
//! 한 번의 폴링이 실패해도 루프는 계속되며 다음 틱에서 다시 시도합니다.
//! 마커 매처는 첫 틱에서 컴파일되고, 실패하면 그 주기를 건너뛰고 다음 틱에 재시도합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use hyperlook_core::config::HyperlookConfig;
use hyperlook_core::error::{HyperlookError, PipelineError};
use hyperlook_core::metrics as m;
use hyperlook_core::pipeline::{HealthStatus, Pipeline};

use crate::analysis::{AnalysisReport, MarkerMatcher, MarkerPatterns, ProposalAnalyzer};
use crate::collector::SearchClient;
use crate::error::AnalyzerError;
use crate::parser::decode_hits;
use crate::sink::{GaugeSink, MetricsSink};

/// 검색 → 디코딩 → 분석을 한 번 수행합니다.
///
/// 폴링 결과와 소요 시간은 자체 메트릭(`hyperlook_*`)에도 기록됩니다.
///
/// # Errors
/// 수집 또는 디코딩이 실패하면 분석 없이 에러를 반환합니다.
pub async fn poll_once<S>(
    client: &SearchClient,
    analyzer: &ProposalAnalyzer,
    sink: &S,
) -> Result<AnalysisReport, AnalyzerError>
where
    S: MetricsSink + ?Sized,
{
    let started = Instant::now();
    let result = fetch_and_analyze(client, analyzer, sink).await;
    metrics::histogram!(m::ANALYZER_POLL_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    match &result {
        Ok(report) => {
            metrics::counter!(m::ANALYZER_POLLS_TOTAL, m::LABEL_RESULT => "ok").increment(1);
            record_report(report);
        }
        Err(_) => {
            metrics::counter!(m::ANALYZER_POLLS_TOTAL, m::LABEL_RESULT => "error").increment(1);
        }
    }

    result
}

async fn fetch_and_analyze<S>(
    client: &SearchClient,
    analyzer: &ProposalAnalyzer,
    sink: &S,
) -> Result<AnalysisReport, AnalyzerError>
where
    S: MetricsSink + ?Sized,
{
    let body = client.fetch().await?;
    let batch = decode_hits(&body)?;
    Ok(analyzer.analyze(&batch, sink))
}

fn record_report(report: &AnalysisReport) {
    metrics::counter!(m::ANALYZER_RECORDS_ANALYZED_TOTAL).increment(report.records as u64);

    for duration in &report.reported {
        metrics::counter!(
            m::ANALYZER_WINDOWS_CLASSIFIED_TOTAL,
            m::LABEL_CLASSIFICATION => duration.classification.as_str()
        )
        .increment(1);
    }

    for (reason, count) in [
        ("duplicate", report.duplicates),
        ("unrecognized", report.unrecognized),
        ("unterminated", report.unterminated),
    ] {
        if count > 0 {
            metrics::counter!(m::ANALYZER_WINDOWS_DROPPED_TOTAL, m::LABEL_REASON => reason)
                .increment(count as u64);
        }
    }
}

/// 폴링 통계
///
/// 폴링 태스크와 `health_check`가 공유합니다.
#[derive(Debug, Default)]
pub struct PollStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    consecutive_failures: AtomicU64,
    polled: AtomicBool,
}

impl PollStats {
    /// 성공한 폴링 수
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    /// 실패한 폴링 수 (매처 컴파일 실패 포함)
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// 마지막 성공 이후 연속 실패 수
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// 폴링이 한 번이라도 끝났는지 확인합니다.
    pub fn has_polled(&self) -> bool {
        self.polled.load(Ordering::Relaxed)
    }

    fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.polled.store(true, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        self.polled.store(true, Ordering::Relaxed);
    }
}

/// 파이프라인 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 분석 파이프라인 -- 검색 백엔드를 주기적으로 폴링합니다.
///
/// # 사용 예시
/// ```ignore
/// use hyperlook_analyzer::AnalysisPipelineBuilder;
///
/// let mut pipeline = AnalysisPipelineBuilder::from_config(&config)?.build()?;
/// pipeline.start().await?;
/// ```
pub struct AnalysisPipeline<S = GaugeSink> {
    client: SearchClient,
    patterns: MarkerPatterns,
    interval: Duration,
    sink: Arc<S>,
    stats: Arc<PollStats>,
    state: PipelineState,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<S> AnalysisPipeline<S> {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 폴링 통계
    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    /// 폴링 주기
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<S> Pipeline for AnalysisPipeline<S>
where
    S: MetricsSink + 'static,
{
    async fn start(&mut self) -> Result<(), HyperlookError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!(
            url = %self.client.url(),
            container = %self.client.query().container,
            interval_secs = self.interval.as_secs_f64(),
            "starting analysis pipeline"
        );

        self.cancel = CancellationToken::new();
        let poller = Poller {
            client: self.client.clone(),
            patterns: self.patterns.clone(),
            interval: self.interval,
            sink: Arc::clone(&self.sink),
            stats: Arc::clone(&self.stats),
            cancel: self.cancel.clone(),
        };
        self.task = Some(tokio::spawn(poller.run()));

        self.state = PipelineState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), HyperlookError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping analysis pipeline");
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "poll task ended abnormally");
            }
        }

        self.state = PipelineState::Stopped;
        info!(
            succeeded = self.stats.succeeded(),
            failed = self.stats.failed(),
            "analysis pipeline stopped"
        );
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                let failures = self.stats.consecutive_failures();
                if failures > 0 {
                    HealthStatus::Degraded(format!("last {failures} poll(s) failed"))
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 폴링 태스크가 소유하는 상태
struct Poller<S> {
    client: SearchClient,
    patterns: MarkerPatterns,
    interval: Duration,
    sink: Arc<S>,
    stats: Arc<PollStats>,
    cancel: CancellationToken,
}

impl<S> Poller<S>
where
    S: MetricsSink + 'static,
{
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut analyzer: Option<ProposalAnalyzer> = None;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if analyzer.is_none() {
                match MarkerMatcher::with_patterns(&self.patterns) {
                    Ok(matcher) => analyzer = Some(ProposalAnalyzer::with_matcher(matcher)),
                    Err(err) => {
                        error!(error = %err, "marker patterns failed to compile, skipping cycle");
                        self.stats.record_failure();
                        continue;
                    }
                }
            }
            let Some(current) = analyzer.as_ref() else {
                continue;
            };

            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = poll_once(&self.client, current, self.sink.as_ref()) => result,
            };

            match result {
                Ok(report) => {
                    self.stats.record_success();
                    info!(
                        records = report.records,
                        containers = report.containers,
                        reported = report.reported.len(),
                        duplicates = report.duplicates,
                        unrecognized = report.unrecognized,
                        unterminated = report.unterminated,
                        "poll completed"
                    );
                }
                Err(err) => {
                    self.stats.record_failure();
                    warn!(error = %err, "poll failed, retrying next tick");
                }
            }
        }

        info!("poll loop exited");
    }
}

/// 분석 파이프라인 빌더
pub struct AnalysisPipelineBuilder<S = GaugeSink> {
    client: SearchClient,
    patterns: MarkerPatterns,
    interval: Duration,
    sink: S,
}

impl AnalysisPipelineBuilder<GaugeSink> {
    /// 새 빌더를 생성합니다. 기본 주기는 60초입니다.
    pub fn new(client: SearchClient) -> Self {
        Self {
            client,
            patterns: MarkerPatterns::default(),
            interval: Duration::from_secs(60),
            sink: GaugeSink,
        }
    }

    /// 통합 설정에서 빌더를 생성합니다.
    pub fn from_config(config: &HyperlookConfig) -> Result<Self, AnalyzerError> {
        let client = SearchClient::from_config(&config.search)?;
        Ok(Self::new(client).interval(Duration::from_secs(config.poller.interval_secs)))
    }
}

impl<S> AnalysisPipelineBuilder<S>
where
    S: MetricsSink + 'static,
{
    /// 폴링 주기를 지정합니다.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// 마커 패턴을 지정합니다.
    pub fn patterns(mut self, patterns: MarkerPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// 결과를 기록할 싱크를 지정합니다.
    pub fn sink<T>(self, sink: T) -> AnalysisPipelineBuilder<T>
    where
        T: MetricsSink + 'static,
    {
        AnalysisPipelineBuilder {
            client: self.client,
            patterns: self.patterns,
            interval: self.interval,
            sink,
        }
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Errors
    /// 폴링 주기가 0이면 [`AnalyzerError::Config`].
    pub fn build(self) -> Result<AnalysisPipeline<S>, AnalyzerError> {
        if self.interval.is_zero() {
            return Err(AnalyzerError::Config {
                field: "poller.interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(AnalysisPipeline {
            client: self.client,
            patterns: self.patterns,
            interval: self.interval,
            sink: Arc::new(self.sink),
            stats: Arc::new(PollStats::default()),
            state: PipelineState::Initialized,
            cancel: CancellationToken::new(),
            task: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use hyperlook_core::config::SearchConfig;

    use super::*;

    fn client() -> SearchClient {
        SearchClient::from_config(&SearchConfig::default()).unwrap()
    }

    fn broken_patterns() -> MarkerPatterns {
        MarkerPatterns {
            boundary: "ProcessProposal(".to_owned(),
            ..MarkerPatterns::default()
        }
    }

    #[test]
    fn builder_creates_pipeline() {
        let pipeline = AnalysisPipelineBuilder::new(client())
            .interval(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(pipeline.state_name(), "initialized");
        assert_eq!(pipeline.interval(), Duration::from_secs(5));
        assert_eq!(pipeline.stats().succeeded(), 0);
        assert!(!pipeline.stats().has_polled());
    }

    #[test]
    fn builder_rejects_zero_interval() {
        let result = AnalysisPipelineBuilder::new(client())
            .interval(Duration::ZERO)
            .build();
        assert!(matches!(result, Err(AnalyzerError::Config { .. })));
    }

    #[test]
    fn builder_from_default_config() {
        let pipeline = AnalysisPipelineBuilder::from_config(&HyperlookConfig::default())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(pipeline.interval(), Duration::from_secs(60));
    }

    #[test]
    fn poll_stats_track_consecutive_failures() {
        let stats = PollStats::default();
        stats.record_failure();
        stats.record_failure();
        assert_eq!(stats.consecutive_failures(), 2);
        stats.record_success();
        assert_eq!(stats.consecutive_failures(), 0);
        assert_eq!(stats.failed(), 2);
        assert_eq!(stats.succeeded(), 1);
        assert!(stats.has_polled());
    }

    #[tokio::test]
    async fn stop_before_start_fails() {
        let mut pipeline = AnalysisPipelineBuilder::new(client()).build().unwrap();
        assert!(pipeline.health_check().await.is_unhealthy());
        assert!(pipeline.stop().await.is_err());
    }

    #[tokio::test]
    async fn broken_patterns_are_retried_every_tick() {
        let mut pipeline = AnalysisPipelineBuilder::new(client())
            .interval(Duration::from_millis(10))
            .patterns(broken_patterns())
            .build()
            .unwrap();

        pipeline.start().await.unwrap();
        assert!(matches!(
            pipeline.start().await,
            Err(HyperlookError::Pipeline(PipelineError::AlreadyRunning))
        ));

        for _ in 0..200 {
            if pipeline.stats().failed() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(pipeline.stats().failed() >= 2);
        assert_eq!(pipeline.stats().succeeded(), 0);
        assert!(matches!(
            pipeline.health_check().await,
            HealthStatus::Degraded(_)
        ));

        pipeline.stop().await.unwrap();
        assert_eq!(pipeline.state_name(), "stopped");
        assert!(pipeline.health_check().await.is_unhealthy());
    }
}
