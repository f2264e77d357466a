//! 윈도우 추적기 -- 컨테이너별 제안 처리 윈도우를 재구성합니다.
//!
//! 배치는 최신 → 과거 순으로 흐르므로 `Exit`가 먼저 보이고, 그 뒤로 내용 마커,
//! 마지막으로 짝이 되는 `Entry`가 나타납니다. `Entry`를 만나는 순간 윈도우가
//! 소비되며 분류 결과와 무관하게 누적값이 초기화됩니다.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use hyperlook_core::types::LogRecord;

use super::marker::{Boundary, CONTENT_MARKERS, MarkerHits};
use super::signature::{Classification, signature};
use crate::sink::MetricsSink;

/// 보고된 제안 처리 시간
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProposalDuration {
    /// 컨테이너 이름
    pub container: String,
    /// 제안 종류
    pub classification: Classification,
    /// 윈도우 시작 (`Entry` 시퀀스)
    pub started_at: u64,
    /// 윈도우 끝 (`Exit` 시퀀스)
    pub finished_at: u64,
    /// 처리 시간 (초)
    pub duration_secs: f64,
}

/// 경계 라인 하나를 처리한 결과
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    /// 새 분류가 싱크에 보고됨
    Reported(ProposalDuration),
    /// 이번 배치에서 이미 보고된 분류라 버림
    Duplicate(Classification),
    /// 시그니처 테이블에 없는 윈도우
    Unrecognized(u64),
    /// 짝이 되는 `Exit` 없이 `Entry`만 보임
    Unterminated,
}

/// 컨테이너별 누적 상태
///
/// 배치 안에서 처음 보일 때 생성되고 배치가 끝나면 버려집니다.
#[derive(Debug, Default)]
pub struct ContainerState {
    marker_counts: [u32; CONTENT_MARKERS],
    pending_window_end: Option<u64>,
    reported: HashSet<Classification>,
}

impl ContainerState {
    /// 현재 마커 누적값
    pub fn marker_counts(&self) -> &[u32; CONTENT_MARKERS] {
        &self.marker_counts
    }

    /// 아직 소비되지 않은 가장 최근 `Exit` 시퀀스
    pub fn pending_window_end(&self) -> Option<u64> {
        self.pending_window_end
    }

    /// 이번 배치에서 이미 보고된 분류인지 확인합니다.
    pub fn has_reported(&self, classification: Classification) -> bool {
        self.reported.contains(&classification)
    }

    fn accumulate(&mut self, hits: &MarkerHits) {
        for kind in hits.content() {
            let Some(slot) = kind.slot() else { continue };
            if kind.is_counter() {
                self.marker_counts[slot] = self.marker_counts[slot].saturating_add(1);
            } else {
                self.marker_counts[slot] = 1;
            }
        }
    }

    fn reset_window(&mut self) {
        self.marker_counts = [0; CONTENT_MARKERS];
        self.pending_window_end = None;
    }
}

/// 윈도우 추적기 -- 컨테이너 이름 → [`ContainerState`]
#[derive(Debug, Default)]
pub struct WindowTracker {
    containers: HashMap<String, ContainerState>,
}

impl WindowTracker {
    /// 빈 추적기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 추적 중인 컨테이너 수
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// 컨테이너 상태를 조회합니다.
    pub fn state(&self, container: &str) -> Option<&ContainerState> {
        self.containers.get(container)
    }

    /// 레코드 하나를 접어 넣습니다.
    ///
    /// 경계 라인(`Entry`)에서 윈도우가 소비되면 그 결과를 반환하고,
    /// 새 분류는 `sink`에 기록합니다. 그 외에는 `None`을 반환합니다.
    pub fn observe<S>(
        &mut self,
        record: &LogRecord,
        hits: &MarkerHits,
        sink: &S,
    ) -> Option<WindowOutcome>
    where
        S: MetricsSink + ?Sized,
    {
        let state = self
            .containers
            .entry(record.container.clone())
            .or_default();

        match hits.boundary() {
            Some(Boundary::End) => {
                state.pending_window_end = Some(record.sequence);
                None
            }
            Some(Boundary::Start) => Some(Self::close_window(state, record, sink)),
            None => {
                state.accumulate(hits);
                None
            }
        }
    }

    fn close_window<S>(state: &mut ContainerState, record: &LogRecord, sink: &S) -> WindowOutcome
    where
        S: MetricsSink + ?Sized,
    {
        let Some(finished_at) = state.pending_window_end else {
            debug!(
                container = %record.container,
                sequence = record.sequence,
                "window start without end, discarding"
            );
            state.reset_window();
            return WindowOutcome::Unterminated;
        };

        let sig = signature(&state.marker_counts);
        state.reset_window();

        let Some(classification) = Classification::from_signature(sig) else {
            debug!(
                container = %record.container,
                signature = sig,
                "unrecognized proposal window"
            );
            return WindowOutcome::Unrecognized(sig);
        };

        if !state.reported.insert(classification) {
            debug!(
                container = %record.container,
                classification = %classification,
                "classification already reported in this batch"
            );
            return WindowOutcome::Duplicate(classification);
        }

        let started_at = record.sequence;
        if finished_at < started_at {
            warn!(
                container = %record.container,
                started_at,
                finished_at,
                "window ends before it starts, batch is not newest-first"
            );
        }
        #[allow(clippy::cast_precision_loss)]
        let duration_secs = finished_at.saturating_sub(started_at) as f64 / 1000.0;

        info!(
            container = %record.container,
            classification = %classification,
            started_at,
            finished_at,
            duration_secs,
            "proposal window classified"
        );
        sink.set_gauge(classification, &record.container, duration_secs);

        WindowOutcome::Reported(ProposalDuration {
            container: record.container.clone(),
            classification,
            started_at,
            finished_at,
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::analysis::marker::MarkerMatcher;

    #[derive(Default)]
    struct Recording(Mutex<Vec<(Classification, String, f64)>>);

    impl MetricsSink for Recording {
        fn set_gauge(&self, classification: Classification, container: &str, seconds: f64) {
            self.0
                .lock()
                .unwrap()
                .push((classification, container.to_owned(), seconds));
        }
    }

    const ENTRY: &str = "[endorser] ProcessProposal -> DEBU 001 Entry";
    const EXIT: &str = "[endorser] ProcessProposal -> DEBU 002 Exit";

    fn sc(name: &str) -> String {
        format!("[chaincode] chain=mychannel, chaincode={name}")
    }

    fn feed(
        tracker: &mut WindowTracker,
        sink: &Recording,
        container: &str,
        line: &str,
        seq: u64,
    ) -> Option<WindowOutcome> {
        let matcher = MarkerMatcher::new().unwrap();
        let record = LogRecord::new(container, line, seq);
        let hits = matcher.classify_line(&record.line);
        tracker.observe(&record, &hits, sink)
    }

    #[test]
    fn flag_markers_are_idempotent() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        feed(&mut tracker, &sink, "p0", &sc("escc"), 90);
        feed(&mut tracker, &sink, "p0", &sc("escc"), 80);
        assert_eq!(tracker.state("p0").unwrap().marker_counts()[1], 1);
    }

    #[test]
    fn lscc_marker_accumulates() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        for seq in [90, 80, 70] {
            feed(&mut tracker, &sink, "p0", &sc("lscc"), seq);
        }
        assert_eq!(tracker.state("p0").unwrap().marker_counts()[2], 3);
    }

    #[test]
    fn exit_overwrites_pending_end() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        feed(&mut tracker, &sink, "p0", EXIT, 200);
        feed(&mut tracker, &sink, "p0", EXIT, 150);
        assert_eq!(tracker.state("p0").unwrap().pending_window_end(), Some(150));
    }

    #[test]
    fn entry_without_exit_is_unterminated_and_resets() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        feed(&mut tracker, &sink, "p0", &sc("escc"), 90);
        let outcome = feed(&mut tracker, &sink, "p0", ENTRY, 80);

        assert_eq!(outcome, Some(WindowOutcome::Unterminated));
        assert_eq!(tracker.state("p0").unwrap().marker_counts(), &[0; 6]);
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn invoke_window_reports_duration() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        assert_eq!(feed(&mut tracker, &sink, "p0", EXIT, 100), None);
        feed(&mut tracker, &sink, "p0", &sc("escc"), 90);
        feed(&mut tracker, &sink, "p0", &sc("lscc"), 70);
        feed(&mut tracker, &sink, "p0", &sc("vscc"), 50);
        let outcome = feed(&mut tracker, &sink, "p0", ENTRY, 40);

        match outcome {
            Some(WindowOutcome::Reported(duration)) => {
                assert_eq!(duration.classification, Classification::Invoke);
                assert_eq!(duration.started_at, 40);
                assert_eq!(duration.finished_at, 100);
                assert!((duration.duration_secs - 0.06).abs() < 1e-9);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let calls = sink.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "p0");
    }

    #[test]
    fn window_is_consumed_even_when_unrecognized() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        feed(&mut tracker, &sink, "p0", EXIT, 100);
        feed(&mut tracker, &sink, "p0", &sc("escc"), 90);
        feed(&mut tracker, &sink, "p0", &sc("lscc"), 80);
        feed(&mut tracker, &sink, "p0", &sc("lscc"), 70);
        let outcome = feed(&mut tracker, &sink, "p0", ENTRY, 60);

        assert_eq!(outcome, Some(WindowOutcome::Unrecognized(10)));
        let state = tracker.state("p0").unwrap();
        assert_eq!(state.marker_counts(), &[0; 6]);
        assert_eq!(state.pending_window_end(), None);
    }

    #[test]
    fn duplicate_classification_resets_window() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        for base in [200, 100] {
            feed(&mut tracker, &sink, "p0", EXIT, base);
            feed(&mut tracker, &sink, "p0", &sc("escc"), base - 10);
            feed(&mut tracker, &sink, "p0", &sc("lscc"), base - 20);
            feed(&mut tracker, &sink, "p0", ENTRY, base - 30);
        }
        // 세 번째 윈도우는 Exit 없이 시작 -> 중복 윈도우의 end가 남아 있으면 안 됨
        let outcome = feed(&mut tracker, &sink, "p0", ENTRY, 10);

        assert_eq!(outcome, Some(WindowOutcome::Unterminated));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
        assert!(tracker.state("p0").unwrap().has_reported(Classification::Query));
    }

    #[test]
    fn reversed_window_saturates_to_zero() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        feed(&mut tracker, &sink, "p0", EXIT, 10);
        feed(&mut tracker, &sink, "p0", &sc("vscc"), 20);
        let outcome = feed(&mut tracker, &sink, "p0", ENTRY, 30);

        match outcome {
            Some(WindowOutcome::Reported(duration)) => {
                assert_eq!(duration.classification, Classification::InstallChaincode);
                assert_eq!(duration.duration_secs, 0.0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn containers_do_not_share_state() {
        let sink = Recording::default();
        let mut tracker = WindowTracker::new();
        feed(&mut tracker, &sink, "p0", EXIT, 100);
        feed(&mut tracker, &sink, "p1", &sc("vscc"), 95);
        let outcome = feed(&mut tracker, &sink, "p1", ENTRY, 90);

        assert_eq!(outcome, Some(WindowOutcome::Unterminated));
        assert_eq!(tracker.container_count(), 2);
        assert_eq!(tracker.state("p0").unwrap().pending_window_end(), Some(100));
    }
}
