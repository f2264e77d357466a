//! 제안 윈도우 분석 -- 마커 매칭, 윈도우 추적, 시그니처 분류
//!
//! [`ProposalAnalyzer`]는 배치 하나를 받아 컨테이너별 제안 처리 윈도우를
//! 재구성하고, 분류된 처리 시간을 [`MetricsSink`]에 기록합니다.
//!
//! # 처리 흐름
//! ```text
//! LogRecord (newest first) -> MarkerMatcher -> WindowTracker -> MetricsSink
//!                                                   |
//!                                             SIGNATURE_TABLE
//! ```
//!
//! 배치 간에는 상태를 공유하지 않습니다. 같은 윈도우가 연속된 두 폴링 응답에
//! 모두 포함되면 두 번 보고됩니다.

pub mod marker;
pub mod signature;
pub mod tracker;

pub use marker::{Boundary, MarkerHits, MarkerKind, MarkerMatcher, MarkerPatterns};
pub use signature::{Classification, SIGNATURE_TABLE};
pub use tracker::{ContainerState, ProposalDuration, WindowOutcome, WindowTracker};

use serde::Serialize;

use hyperlook_core::types::LogRecord;

use crate::error::AnalyzerError;
use crate::sink::MetricsSink;

/// 배치 분석 결과 요약
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// 처리한 레코드 수
    pub records: usize,
    /// 배치에 등장한 컨테이너 수
    pub containers: usize,
    /// 싱크에 보고된 결과 (보고 순서)
    pub reported: Vec<ProposalDuration>,
    /// 이미 보고된 분류라 버린 윈도우 수
    pub duplicates: usize,
    /// 시그니처 테이블에 없는 윈도우 수
    pub unrecognized: usize,
    /// `Exit` 없이 시작된 윈도우 수
    pub unterminated: usize,
}

impl AnalysisReport {
    fn record(&mut self, outcome: WindowOutcome) {
        match outcome {
            WindowOutcome::Reported(duration) => self.reported.push(duration),
            WindowOutcome::Duplicate(_) => self.duplicates += 1,
            WindowOutcome::Unrecognized(_) => self.unrecognized += 1,
            WindowOutcome::Unterminated => self.unterminated += 1,
        }
    }
}

/// 제안 분석기
///
/// 마커 패턴은 생성 시 한 번만 컴파일됩니다.
pub struct ProposalAnalyzer {
    matcher: MarkerMatcher,
}

impl ProposalAnalyzer {
    /// 기본 마커 패턴으로 분석기를 생성합니다.
    pub fn new() -> Result<Self, AnalyzerError> {
        Ok(Self {
            matcher: MarkerMatcher::new()?,
        })
    }

    /// 이미 컴파일된 매처로 분석기를 생성합니다.
    pub fn with_matcher(matcher: MarkerMatcher) -> Self {
        Self { matcher }
    }

    /// 최신 → 과거 순으로 정렬된 배치를 한 번에 접습니다.
    ///
    /// 매 호출마다 새 [`WindowTracker`]를 만들므로 중복 보고 방지는 배치 안에서만 유효합니다.
    pub fn analyze<S>(&self, batch: &[LogRecord], sink: &S) -> AnalysisReport
    where
        S: MetricsSink + ?Sized,
    {
        let mut tracker = WindowTracker::new();
        let mut report = AnalysisReport {
            records: batch.len(),
            ..AnalysisReport::default()
        };

        for record in batch {
            let hits = self.matcher.classify_line(&record.line);
            if let Some(outcome) = tracker.observe(record, &hits, sink) {
                report.record(outcome);
            }
        }

        report.containers = tracker.container_count();
        report
    }
}
